use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::formats::InputFilter;

/// Something discovery skipped, reported to the user but never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// A file input whose extension is not accepted
    SkippedFile(PathBuf),
    /// A directory input with no matching file anywhere below it
    EmptyDirectory(PathBuf),
    /// A path that is neither a file nor a directory
    NotFound(PathBuf),
    /// A directory entry that could not be read during the walk
    Unreadable { path: PathBuf, message: String },
}

impl DiscoveryWarning {
    pub fn message(&self, filter: InputFilter) -> String {
        match self {
            DiscoveryWarning::SkippedFile(path) => format!(
                "Skipping non-{} file: {}",
                filter.describe(),
                path.display()
            ),
            DiscoveryWarning::EmptyDirectory(path) => format!(
                "No {} files found in directory: {}",
                filter.describe(),
                path.display()
            ),
            DiscoveryWarning::NotFound(path) => {
                format!("Input path does not exist: {}", path.display())
            }
            DiscoveryWarning::Unreadable { path, message } => {
                format!("Cannot read {}: {}", path.display(), message)
            }
        }
    }
}

/// Files found by [`discover`], plus anything that was skipped on the way
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Append a file unless it is already present
    fn push_unique(&mut self, seen: &mut HashSet<PathBuf>, path: PathBuf) -> bool {
        if seen.insert(path.clone()) {
            self.files.push(path);
            true
        } else {
            false
        }
    }
}

/// Expand file and directory inputs into a flat, deduplicated file list.
///
/// Files are kept in input order; each directory contributes its matches in
/// file-name order. Nothing here is fatal: skipped inputs end up in
/// [`Discovery::warnings`].
pub fn discover<P: AsRef<Path>>(inputs: &[P], filter: InputFilter) -> Discovery {
    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();

    for input in inputs {
        let input = input.as_ref();

        if input.is_file() {
            if filter.matches(input) {
                discovery.push_unique(&mut seen, input.to_path_buf());
            } else {
                discovery
                    .warnings
                    .push(DiscoveryWarning::SkippedFile(input.to_path_buf()));
            }
        } else if input.is_dir() {
            let found = walk_directory(input, filter, &mut discovery.warnings);
            if found.is_empty() {
                discovery
                    .warnings
                    .push(DiscoveryWarning::EmptyDirectory(input.to_path_buf()));
            }
            for path in found {
                discovery.push_unique(&mut seen, path);
            }
        } else {
            discovery
                .warnings
                .push(DiscoveryWarning::NotFound(input.to_path_buf()));
        }
    }

    discovery
}

/// Recursively collect matching files below `dir`
pub fn walk_directory(
    dir: &Path,
    filter: InputFilter,
    warnings: &mut Vec<DiscoveryWarning>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && filter.matches(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf());
                warnings.push(DiscoveryWarning::Unreadable {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    files
}

impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} warning(s)",
            self.files.len(),
            self.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_directory_walk_is_case_insensitive_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.HEIC"));
        touch(&root.join("b.heic"));
        touch(&root.join("c.txt"));
        touch(&root.join("sub/d.heic"));

        let discovery = discover(&[root], InputFilter::HeicOnly);

        let found: HashSet<PathBuf> = discovery.files.iter().cloned().collect();
        let expected: HashSet<PathBuf> = [
            root.join("a.HEIC"),
            root.join("b.heic"),
            root.join("sub/d.heic"),
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
        assert_eq!(discovery.files.len(), 3);
        assert!(discovery.warnings.is_empty());
    }

    #[test]
    fn test_non_matching_file_input_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.jpg");
        touch(&photo);

        let discovery = discover(&[&photo], InputFilter::HeicOnly);
        assert!(discovery.is_empty());
        assert_eq!(discovery.warnings, vec![DiscoveryWarning::SkippedFile(photo.clone())]);

        let discovery = discover(&[&photo], InputFilter::AllImages);
        assert_eq!(discovery.files, vec![photo]);
    }

    #[test]
    fn test_empty_directory_and_missing_path_warn() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let missing = dir.path().join("missing");

        let discovery = discover(&[&empty, &missing], InputFilter::HeicOnly);
        assert!(discovery.is_empty());
        assert_eq!(
            discovery.warnings,
            vec![
                DiscoveryWarning::EmptyDirectory(empty),
                DiscoveryWarning::NotFound(missing),
            ]
        );
    }

    #[test]
    fn test_inputs_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.heic");
        touch(&file);

        let discovery = discover(
            &[file.clone(), dir.path().to_path_buf(), file.clone()],
            InputFilter::HeicOnly,
        );
        assert_eq!(discovery.files, vec![file]);
    }

    #[test]
    fn test_all_images_filter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.PNG", "c.webp", "d.gif", "e.bmp", "f.tiff", "g.heic", "h.txt"] {
            touch(&dir.path().join(name));
        }

        let discovery = discover(&[dir.path()], InputFilter::AllImages);
        assert_eq!(discovery.files.len(), 7);
        assert!(!discovery.files.iter().any(|p| p.ends_with("h.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let outside = dir.path().join("outside");
        touch(&root.join("kept.heic"));
        touch(&outside.join("linked.heic"));
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let discovery = discover(&[&root], InputFilter::HeicOnly);
        assert_eq!(discovery.files, vec![root.join("kept.heic")]);
        assert!(discovery.warnings.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_warns_and_walk_continues() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let locked = root.join("locked");
        touch(&root.join("a.heic"));
        touch(&locked.join("hidden.heic"));
        touch(&root.join("z.heic"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop privileged users
        let readable = fs::read_dir(&locked).is_ok();
        let discovery = discover(&[root], InputFilter::HeicOnly);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert_eq!(discovery.files, vec![root.join("a.heic"), root.join("z.heic")]);
        assert!(matches!(
            discovery.warnings.as_slice(),
            [DiscoveryWarning::Unreadable { path, .. }] if path == &locked
        ));
    }

    #[test]
    fn test_warning_messages() {
        let warning = DiscoveryWarning::NotFound(PathBuf::from("nope"));
        assert_eq!(
            warning.message(InputFilter::HeicOnly),
            "Input path does not exist: nope"
        );

        let warning = DiscoveryWarning::SkippedFile(PathBuf::from("a.jpg"));
        assert_eq!(
            warning.message(InputFilter::HeicOnly),
            "Skipping non-HEIC file: a.jpg"
        );
    }
}
