//! JSON output for wrappers and GUIs
//!
//! When --json-progress flag is enabled, all progress and status information
//! is emitted as JSON lines to stdout, suppressing all other output.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// File converted
    FileConverted {
        input_path: String,
        output_path: String,
    },
    /// File conversion failed
    FileFailed { input_path: String, error: String },
    /// File skipped by the compatibility check
    FileSkipped { input_path: String, message: String },
    /// Batch summary
    Summary {
        total_files: usize,
        converted: usize,
        failed: usize,
        skipped: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        Self::Progress {
            current,
            total,
            message: message.into(),
        }
        .emit();
    }

    pub fn file_converted(input_path: &Path, output_path: &Path) {
        Self::FileConverted {
            input_path: input_path.display().to_string(),
            output_path: output_path.display().to_string(),
        }
        .emit();
    }

    pub fn file_failed(input_path: &Path, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    pub fn file_skipped(input_path: &Path, message: impl Into<String>) {
        Self::FileSkipped {
            input_path: input_path.display().to_string(),
            message: message.into(),
        }
        .emit();
    }

    /// Create and emit summary message
    pub fn summary(
        total_files: usize,
        converted: usize,
        failed: usize,
        skipped: usize,
        duration_secs: f64,
    ) {
        Self::Summary {
            total_files,
            converted,
            failed,
            skipped,
            duration_secs,
        }
        .emit();
    }
}
