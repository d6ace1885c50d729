// Library exports for reuse by the CLI, the GUI and other applications
pub mod cli;
pub mod conversion;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use cli::OutputFormat;
pub use conversion::{
    BatchEvent, BatchRunner, BatchSummary, ConversionError, ConversionOptions, ConversionResult,
    ConversionStatus, Converter, FileStage, InputFilter, StopHandle,
};
pub use json_output::JsonMessage;
