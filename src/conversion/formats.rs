use std::path::Path;

use crate::cli::OutputFormat;
use crate::utils::{get_file_extension, has_valid_extension};

/// Extensions accepted by the HEIC-only front-ends
pub const HEIC_EXTENSIONS: &[&str] = &["heic"];

/// Extensions accepted by the unified converter, in file dialog order
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] =
    &["heic", "jpg", "jpeg", "png", "bmp", "gif", "tiff", "webp"];

/// Which input files discovery should pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    /// Only `.heic` files
    HeicOnly,
    /// Every extension in [`SUPPORTED_INPUT_EXTENSIONS`]
    AllImages,
}

impl InputFilter {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            InputFilter::HeicOnly => HEIC_EXTENSIONS,
            InputFilter::AllImages => SUPPORTED_INPUT_EXTENSIONS,
        }
    }

    /// Case-insensitive extension match
    pub fn matches(&self, path: &Path) -> bool {
        has_valid_extension(path, self.extensions())
    }

    /// Short description used in console messages ("HEIC", "image")
    pub fn describe(&self) -> &'static str {
        match self {
            InputFilter::HeicOnly => "HEIC",
            InputFilter::AllImages => "image",
        }
    }
}

/// Output formats that a given input extension can safely be converted to.
///
/// Lookup is case-insensitive and tolerates a leading dot. Unknown
/// extensions map to an empty slice.
pub fn compatible_outputs(input_ext: &str) -> &'static [OutputFormat] {
    let ext = input_ext.trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "heic" | "bmp" | "gif" | "tiff" | "webp" => &OutputFormat::ALL,
        _ => &[],
    }
}

/// Advisory pre-flight check run by the unified converter before decoding
pub fn is_compatible(input_ext: &str, output_format: OutputFormat) -> bool {
    compatible_outputs(input_ext).contains(&output_format)
}

/// [`is_compatible`] applied to a path's extension
pub fn is_path_compatible(path: &Path, output_format: OutputFormat) -> bool {
    get_file_extension(path)
        .map(|ext| is_compatible(&ext, output_format))
        .unwrap_or(false)
}
