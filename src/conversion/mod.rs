pub mod batch;
pub mod codec;
pub mod discovery;
pub mod error;
pub mod formats;

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

pub use batch::{BatchEvent, BatchRunner, BatchSummary, FileStage, StopHandle};
pub use discovery::{discover, Discovery, DiscoveryWarning};
pub use error::ConversionError;
pub use formats::{is_compatible, InputFilter, HEIC_EXTENSIONS, SUPPORTED_INPUT_EXTENSIONS};

/// Fixed JPEG quality used for every conversion
pub const JPEG_QUALITY: u8 = 95;

/// Settings shared by every file of a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub output_format: OutputFormat,
    /// Explicit destination; `None` writes next to each input
    pub output_dir: Option<PathBuf>,
    /// Without an explicit destination, write into `converted_<format>`
    pub create_subfolder: bool,
    pub jpeg_quality: u8,
    pub optimize: bool,
    /// Resolve output paths only, never touch the filesystem
    pub dry_run: bool,
}

impl ConversionOptions {
    pub fn new(output_format: OutputFormat) -> Self {
        Self {
            output_format,
            output_dir: None,
            create_subfolder: false,
            jpeg_quality: JPEG_QUALITY,
            optimize: true,
            dry_run: false,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_subfolder(mut self, create_subfolder: bool) -> Self {
        self.create_subfolder = create_subfolder;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory the converted version of `input` is written to
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }

        let input_dir = input.parent().unwrap_or_else(|| Path::new(""));
        if self.create_subfolder {
            input_dir.join(format!("converted_{}", self.output_format.extension()))
        } else {
            input_dir.to_path_buf()
        }
    }

    /// `<output dir>/<input stem>.<format>`.
    ///
    /// Converting a `.jpg` to jpg in place resolves to the input path itself,
    /// in which case the source file is overwritten.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        self.output_dir_for(input)
            .join(format!("{}.{}", stem, self.output_format.extension()))
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Success,
    SkippedIncompatible,
    Failed,
}

/// Outcome of converting one file
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub status: ConversionStatus,
    pub message: String,
    /// The bare error text of a failed conversion
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(input_path: &Path, output_path: PathBuf, dry_run: bool) -> Self {
        let message = if dry_run {
            format!("Would convert: {} -> {}", input_path.display(), output_path.display())
        } else {
            format!("Successfully converted: {}", output_path.display())
        };

        Self {
            input_path: input_path.to_path_buf(),
            output_path: Some(output_path),
            status: ConversionStatus::Success,
            message,
            error: None,
        }
    }

    pub fn failed(input_path: &Path, error: &ConversionError) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_path: None,
            status: ConversionStatus::Failed,
            message: format!("Error converting {}: {}", input_path.display(), error),
            error: Some(error.to_string()),
        }
    }

    pub fn skipped(input_path: &Path, error: &ConversionError) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_path: None,
            status: ConversionStatus::SkippedIncompatible,
            message: format!("Warning: {}", error),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }
}

/// Converts single files according to a fixed set of options
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert one file. Errors never escape: they become a failed result.
    pub fn convert(&self, input_path: &Path) -> ConversionResult {
        self.convert_with_progress(input_path, || {})
    }

    /// Same as [`Converter::convert`], calling `on_decoded` once the input
    /// has been decoded and before encoding starts
    pub fn convert_with_progress<F>(&self, input_path: &Path, on_decoded: F) -> ConversionResult
    where
        F: FnOnce(),
    {
        match self.try_convert(input_path, on_decoded) {
            Ok(output_path) => {
                ConversionResult::success(input_path, output_path, self.options.dry_run)
            }
            Err(e) => ConversionResult::failed(input_path, &e),
        }
    }

    fn try_convert<F>(&self, input_path: &Path, on_decoded: F) -> error::Result<PathBuf>
    where
        F: FnOnce(),
    {
        // Validate input file
        if !input_path.exists() {
            return Err(ConversionError::InputNotFound(input_path.to_path_buf()));
        }

        let output_dir = self.options.output_dir_for(input_path);
        let output_path = self.options.output_path_for(input_path);

        if self.options.dry_run {
            return Ok(output_path);
        }

        // Create output directory (no-op when it already exists)
        if !output_dir.as_os_str().is_empty() {
            fs::create_dir_all(&output_dir).map_err(|source| ConversionError::Write {
                path: output_dir.clone(),
                source,
            })?;
        }

        // Decode, then drop any alpha channel
        let img = codec::normalize_color(codec::decode(input_path)?);
        on_decoded();

        // Encode fully in memory so a failed encode leaves no partial file
        let bytes = codec::encode(&img, &self.options)?;
        drop(img);

        fs::write(&output_path, bytes).map_err(|source| ConversionError::Write {
            path: output_path.clone(),
            source,
        })?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba, RgbaImage};

    #[test]
    fn test_output_path_defaults_to_input_directory() {
        let options = ConversionOptions::new(OutputFormat::Png);
        assert_eq!(
            options.output_path_for(Path::new("/photos/trip/photo.heic")),
            PathBuf::from("/photos/trip/photo.png")
        );
    }

    #[test]
    fn test_output_path_with_subfolder() {
        let options = ConversionOptions::new(OutputFormat::Jpg).with_subfolder(true);
        assert_eq!(
            options.output_path_for(Path::new("/photos/IMG_0001.HEIC")),
            PathBuf::from("/photos/converted_jpg/IMG_0001.jpg")
        );
    }

    #[test]
    fn test_output_dir_override_wins_over_subfolder() {
        let options = ConversionOptions::new(OutputFormat::Jpg)
            .with_subfolder(true)
            .with_output_dir("/out");
        assert_eq!(
            options.output_path_for(Path::new("/photos/a.heic")),
            PathBuf::from("/out/a.jpg")
        );
    }

    #[test]
    fn test_same_extension_resolves_to_input_path() {
        let options = ConversionOptions::new(OutputFormat::Jpg);
        let input = Path::new("/photos/photo.jpg");
        assert_eq!(options.output_path_for(input), input);
    }

    #[test]
    fn test_rgba_png_becomes_three_channel_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("logo.png");
        RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 64]))
            .save(&input)
            .unwrap();

        let converter = Converter::new(ConversionOptions::new(OutputFormat::Jpg));
        let result = converter.convert(&input);

        assert!(result.is_success(), "{}", result.message);
        let output = dir.path().join("logo.jpg");
        assert_eq!(result.output_path.as_deref(), Some(output.as_path()));
        assert!(output.exists());

        let decoded = image::open(&output).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_same_path_conversion_overwrites_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.jpg");
        // PNG content under a .jpg name, so the rewrite is observable
        image::RgbImage::from_pixel(8, 8, image::Rgb([0, 128, 255]))
            .save_with_format(&input, image::ImageFormat::Png)
            .unwrap();

        let converter = Converter::new(ConversionOptions::new(OutputFormat::Jpg));
        let result = converter.convert(&input);

        assert!(result.is_success(), "{}", result.message);
        assert_eq!(result.output_path.as_deref(), Some(input.as_path()));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let bytes = std::fs::read(&input).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_subfolder_is_created_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        image::RgbImage::new(4, 4).save(&a).unwrap();
        image::RgbImage::new(4, 4).save(&b).unwrap();

        let converter =
            Converter::new(ConversionOptions::new(OutputFormat::Png).with_subfolder(true));
        assert!(converter.convert(&a).is_success());
        assert!(converter.convert(&b).is_success());

        let subfolder = dir.path().join("converted_png");
        assert!(subfolder.join("a.png").exists());
        assert!(subfolder.join("b.png").exists());
    }

    #[test]
    fn test_missing_input_fails_with_message() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.heic");

        let result = Converter::new(ConversionOptions::default()).convert(&missing);
        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.output_path.is_none());
        assert!(result.message.contains("Input file does not exist"));
        assert_eq!(
            result.error,
            Some(format!("Input file does not exist: {}", missing.display()))
        );
    }

    #[test]
    fn test_decode_failure_is_reported_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corrupt.png");
        std::fs::write(&input, b"not really a png").unwrap();

        let result = Converter::new(ConversionOptions::new(OutputFormat::Jpg)).convert(&input);
        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.starts_with("Error converting"));
        assert!(!dir.path().join("corrupt.jpg").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        image::RgbImage::new(4, 4).save(&input).unwrap();

        let options = ConversionOptions::new(OutputFormat::Jpg)
            .with_subfolder(true)
            .with_dry_run(true);
        let result = Converter::new(options).convert(&input);

        assert!(result.is_success());
        assert!(result.message.starts_with("Would convert"));
        assert!(!dir.path().join("converted_jpg").exists());
    }

    #[test]
    fn test_decoded_hook_runs_once_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        image::RgbImage::new(4, 4).save(&input).unwrap();

        let mut calls = 0;
        let result = Converter::new(ConversionOptions::new(OutputFormat::Jpg))
            .convert_with_progress(&input, || calls += 1);
        assert!(result.is_success());
        assert_eq!(calls, 1);
    }
}
