use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ConversionError;
use super::formats::is_path_compatible;
use super::{ConversionOptions, ConversionResult, ConversionStatus, Converter};
use crate::utils::get_file_extension;

/// Cooperative stop flag shared between a running batch and its owner.
///
/// The batch only looks at it between files; a conversion already in
/// progress always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a single file is in its conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStage {
    Starting,
    Skipped { message: String },
    Converting,
    Converted { output_path: PathBuf },
    Errored { message: String },
}

impl FileStage {
    /// Coarse progress marker: 0, 50 or 100
    pub fn percent(&self) -> u8 {
        match self {
            FileStage::Starting => 0,
            FileStage::Converting => 50,
            FileStage::Skipped { .. } | FileStage::Converted { .. } | FileStage::Errored { .. } => {
                100
            }
        }
    }

    /// True once nothing more will happen to the file
    pub fn is_terminal(&self) -> bool {
        self.percent() == 100
    }

    /// Status text shown next to a file
    pub fn status_text(&self) -> String {
        match self {
            FileStage::Starting => "🔄 Starting...".to_string(),
            FileStage::Converting => "🔄 Converting...".to_string(),
            FileStage::Skipped { message } => format!("⚠️ {}", message),
            FileStage::Converted { .. } => "✅ Converted".to_string(),
            FileStage::Errored { message } => format!("❌ Error: {}", message),
        }
    }
}

/// Messages a running batch sends to its listener, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress { path: PathBuf, stage: FileStage },
    /// Successful conversions so far out of the batch size
    Completed { completed: usize, total: usize },
    /// Output directory of the last file that got one, sent once at the end
    OutputFolder(PathBuf),
    /// Always the final event, also after a stop
    Finished,
}

/// Aggregate outcome of one batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files the loop started on, including skipped ones
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Files rejected by the compatibility check
    pub skipped: usize,
    pub results: Vec<ConversionResult>,
    pub last_output_dir: Option<PathBuf>,
    /// The stop flag ended the run before every file was attempted
    pub stopped: bool,
    pub duration: Duration,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results
            .iter()
            .filter(|r| r.status == ConversionStatus::Failed)
    }

    fn record(&mut self, result: ConversionResult) {
        self.attempted += 1;
        match result.status {
            ConversionStatus::Success => self.succeeded += 1,
            ConversionStatus::Failed => self.failed += 1,
            ConversionStatus::SkippedIncompatible => self.skipped += 1,
        }
        self.results.push(result);
    }
}

/// Runs a converter over a list of files, one at a time
#[derive(Debug, Clone)]
pub struct BatchRunner {
    converter: Converter,
    check_compatibility: bool,
    stop: StopHandle,
}

impl BatchRunner {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            converter: Converter::new(options),
            check_compatibility: false,
            stop: StopHandle::new(),
        }
    }

    /// Reject files outside the compatibility table before decoding them
    pub fn with_compatibility_check(mut self, enabled: bool) -> Self {
        self.check_compatibility = enabled;
        self
    }

    /// Use an externally owned stop flag
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn options(&self) -> &ConversionOptions {
        self.converter.options()
    }

    /// Convert every file without reporting progress
    pub fn run<P: AsRef<Path>>(&self, files: &[P]) -> BatchSummary {
        self.run_with_progress(files, |_| {})
    }

    /// Convert every file, sending [`BatchEvent`]s to `on_event` as it goes.
    ///
    /// A failing file never stops the batch. The stop flag is checked before
    /// each file; `Finished` is always the last event.
    pub fn run_with_progress<P, F>(&self, files: &[P], mut on_event: F) -> BatchSummary
    where
        P: AsRef<Path>,
        F: FnMut(BatchEvent),
    {
        let start_time = Instant::now();
        let total = files.len();
        let mut summary = BatchSummary::default();

        for file in files {
            if self.stop.is_stopped() {
                summary.stopped = true;
                break;
            }

            let path = file.as_ref();
            on_event(BatchEvent::Progress {
                path: path.to_path_buf(),
                stage: FileStage::Starting,
            });

            if self.check_compatibility && !is_path_compatible(path, self.options().output_format) {
                let error = ConversionError::Incompatible {
                    extension: get_file_extension(path).unwrap_or_default(),
                    format: self.options().output_format,
                };
                let result = ConversionResult::skipped(path, &error);
                on_event(BatchEvent::Progress {
                    path: path.to_path_buf(),
                    stage: FileStage::Skipped {
                        message: result.message.clone(),
                    },
                });
                summary.record(result);
                continue;
            }

            summary.last_output_dir = Some(self.options().output_dir_for(path));

            let result = self.converter.convert_with_progress(path, || {
                on_event(BatchEvent::Progress {
                    path: path.to_path_buf(),
                    stage: FileStage::Converting,
                })
            });

            match (&result.status, &result.output_path) {
                (ConversionStatus::Success, Some(output_path)) => {
                    let completed = summary.succeeded + 1;
                    on_event(BatchEvent::Completed { completed, total });
                    on_event(BatchEvent::Progress {
                        path: path.to_path_buf(),
                        stage: FileStage::Converted {
                            output_path: output_path.clone(),
                        },
                    });
                }
                _ => on_event(BatchEvent::Progress {
                    path: path.to_path_buf(),
                    stage: FileStage::Errored {
                        message: result.error.clone().unwrap_or_else(|| result.message.clone()),
                    },
                }),
            }

            summary.record(result);
        }

        if let Some(dir) = &summary.last_output_dir {
            on_event(BatchEvent::OutputFolder(dir.clone()));
        }
        on_event(BatchEvent::Finished);

        summary.duration = start_time.elapsed();
        summary
    }
}
