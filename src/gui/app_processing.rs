// Conversion driver for the GUI
// The batch runs on a worker thread and reports back over a channel

use super::ConverterApp;
use eframe::egui;
use heic_converter::conversion::{BatchEvent, BatchRunner, ConversionOptions, FileStage};
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::mpsc::{channel, TryRecvError};

impl ConverterApp {
    pub fn start_conversion(&mut self, ctx: &egui::Context) {
        if self.is_converting {
            return;
        }
        if self.files.is_empty() {
            self.error_message = "Please add files to convert".to_string();
            return;
        }

        // Clear previous state
        self.files.reset_progress();
        self.is_converting = true;
        self.completed_count = 0;
        self.total_count = self.files.len();
        self.error_message.clear();
        self.status_message = format!("0/{} files converted", self.total_count);

        let options =
            ConversionOptions::new(self.output_format).with_subfolder(self.create_subfolder);
        let runner = BatchRunner::new(options).with_compatibility_check(true);
        self.stop_handle = Some(runner.stop_handle());

        // Create channel for progress updates
        let (tx, rx) = channel();
        self.progress_receiver = Some(rx);

        let files = self.files.paths();
        let ctx = ctx.clone();

        self.worker = Some(std::thread::spawn(move || {
            runner.run_with_progress(&files, |event| {
                let _ = tx.send(event);
                ctx.request_repaint();
            });
        }));
    }

    /// Signal the worker, wait for it, then apply whatever it sent
    pub fn stop_conversion(&mut self) {
        if let Some(stop) = &self.stop_handle {
            stop.stop();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                self.error_message = "Conversion worker stopped unexpectedly".to_string();
            }
        }
        self.check_progress();

        if self.is_converting {
            self.finish_conversion();
        }
        self.status_message = format!(
            "Stopped: {}/{} files converted",
            self.completed_count, self.total_count
        );
    }

    /// Check for progress updates from the background thread
    pub fn check_progress(&mut self) {
        // Collect all messages first to avoid borrowing issues
        let mut messages = Vec::new();
        let mut disconnected = false;
        if let Some(ref receiver) = self.progress_receiver {
            loop {
                match receiver.try_recv() {
                    Ok(msg) => messages.push(msg),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        for msg in messages {
            match msg {
                BatchEvent::Progress { path, stage } => {
                    if let FileStage::Skipped { message } = &stage {
                        self.error_message = message.clone();
                    }
                    self.files.apply(&path, &stage);
                }
                BatchEvent::Completed { completed, total } => {
                    self.completed_count = completed;
                    self.total_count = total;
                    self.status_message = format!("{}/{} files converted", completed, total);
                }
                BatchEvent::OutputFolder(dir) => {
                    if self.auto_open {
                        if let Err(e) = open_folder(&dir) {
                            self.error_message =
                                format!("Could not open {}: {}", dir.display(), e);
                        }
                    }
                }
                BatchEvent::Finished => self.finish_conversion(),
            }
        }

        // Worker went away without sending Finished
        if disconnected && self.is_converting {
            self.error_message = "Conversion worker stopped unexpectedly".to_string();
            self.finish_conversion();
        }
    }

    fn finish_conversion(&mut self) {
        self.is_converting = false;
        self.stop_handle = None;
        self.progress_receiver = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.status_message = format!(
            "{}/{} files converted",
            self.completed_count, self.total_count
        );
    }
}

/// Open a folder with the platform file manager
pub(crate) fn open_folder(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let program = "xdg-open";

    Command::new(program).arg(path).spawn().map(|_| ())
}
