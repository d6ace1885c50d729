use std::path::PathBuf;
use thiserror::Error;

use crate::cli::OutputFormat;

/// Everything that can go wrong while converting a single file.
///
/// Library errors are kept as their original message so the text shown to
/// the user is exactly what the decoder or encoder reported.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Converting from .{extension} to {} may result in quality loss", .format.label())]
    Incompatible {
        extension: String,
        format: OutputFormat,
    },

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),

    #[error("{}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConversionError>;
