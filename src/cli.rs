use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use crate::conversion::{ConversionOptions, InputFilter};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// JPEG output at fixed quality 95
    #[default]
    #[value(name = "jpg")]
    Jpg,
    /// Lossless PNG output with best compression
    #[value(name = "png")]
    Png,
}

impl OutputFormat {
    /// All output formats, in the order the GUI lists them
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Jpg, OutputFormat::Png];

    /// Lowercase file extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// Uppercase label used in console and GUI text
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "JPG",
            OutputFormat::Png => "PNG",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "heic-converter",
    version,
    about = "Convert HEIC/HEIF images to JPG or PNG format",
    long_about = "
HEIC Converter - batch conversion of HEIC/HEIF images to JPG or PNG.

Directories are scanned recursively. Each converted file is written next to
its source (or into --output) as <name>.<format>; existing files are
overwritten.

Examples:
  Convert a single file:
    heic-converter input.heic

  Convert multiple files:
    heic-converter file1.heic file2.heic

  Convert all HEIC files in a directory:
    heic-converter /path/to/directory

  Convert to PNG format:
    heic-converter --format png input.heic

  Specify output directory:
    heic-converter --output /path/to/output input.heic

  Convert every supported image (jpg, png, bmp, gif, tiff, webp, heic):
    heic-converter --all-formats --subfolder ~/Pictures

  Show what would be written without touching any file:
    heic-converter --dry-run --verbose ~/Pictures"
)]
pub struct Args {
    /// Input HEIC file(s) or directory containing HEIC files
    #[arg(required = true, value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Output format
    #[arg(long = "format", default_value = "jpg", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output directory (default: same as input file)
    #[arg(long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Write into a converted_<format> subfolder next to each input (ignored with --output)
    #[arg(long = "subfolder")]
    pub subfolder: bool,

    /// Accept every supported image type, not only HEIC
    #[arg(long = "all-formats")]
    pub all_formats: bool,

    /// Resolve output paths and report them without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit JSON lines instead of human readable output
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Extension filter used for discovery
    pub fn input_filter(&self) -> InputFilter {
        if self.all_formats {
            InputFilter::AllImages
        } else {
            InputFilter::HeicOnly
        }
    }

    /// Build the conversion options described by these arguments
    pub fn conversion_options(&self) -> ConversionOptions {
        let mut options = ConversionOptions::new(self.format)
            .with_subfolder(self.subfolder)
            .with_dry_run(self.dry_run);
        if let Some(dir) = &self.output {
            options = options.with_output_dir(dir.clone());
        }
        options
    }
}
