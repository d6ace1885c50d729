use eframe::egui;
use heic_converter::cli::OutputFormat;
use heic_converter::conversion::discovery::walk_directory;
use heic_converter::conversion::{BatchEvent, FileStage, InputFilter, StopHandle};
use heic_converter::utils::display_name;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

#[path = "app_processing.rs"]
mod app_processing;

/// One file in the conversion list
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileRow {
    pub path: PathBuf,
    pub progress: f32,
    pub status: String,
}

impl FileRow {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }

    fn apply(&mut self, stage: &FileStage) {
        self.progress = stage.percent() as f32 / 100.0;
        self.status = stage.status_text();
    }
}

/// Ordered, duplicate-free list of queued files
#[derive(Debug, Default)]
pub(crate) struct FileList {
    rows: Vec<FileRow>,
    seen: HashSet<PathBuf>,
}

impl FileList {
    /// Add files as given and expand directories; returns how many were new
    pub fn add_paths<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) -> usize {
        let mut added = 0;
        for path in paths {
            if path.is_dir() {
                let mut warnings = Vec::new();
                for file in walk_directory(&path, InputFilter::AllImages, &mut warnings) {
                    added += self.push(file) as usize;
                }
            } else {
                added += self.push(path) as usize;
            }
        }
        added
    }

    fn push(&mut self, path: PathBuf) -> bool {
        if self.seen.insert(path.clone()) {
            self.rows.push(FileRow::new(path));
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, path: &Path, stage: &FileStage) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.path == path) {
            row.apply(stage);
        }
    }

    pub fn reset_progress(&mut self) {
        for row in &mut self.rows {
            row.progress = 0.0;
            row.status = "Queued".to_string();
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.rows.iter().map(|row| row.path.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct ConverterApp {
    // Queued files
    files: FileList,

    // Conversion settings
    output_format: OutputFormat,
    create_subfolder: bool,
    auto_open: bool,

    // Conversion state
    is_converting: bool,
    completed_count: usize,
    total_count: usize,
    status_message: String,
    error_message: String,

    // Background worker
    worker: Option<JoinHandle<()>>,
    stop_handle: Option<StopHandle>,
    progress_receiver: Option<Receiver<BatchEvent>>,
}

impl ConverterApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            files: FileList::default(),
            output_format: OutputFormat::Jpg,
            create_subfolder: false,
            auto_open: false,
            is_converting: false,
            completed_count: 0,
            total_count: 0,
            status_message: String::new(),
            error_message: String::new(),
            worker: None,
            stop_handle: None,
            progress_receiver: None,
        }
    }

    fn add_files(&mut self, paths: Vec<PathBuf>) {
        if self.is_converting {
            return;
        }
        self.files.add_paths(paths);
        self.status_message = format!("{} files detected", self.files.len());
        self.error_message.clear();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.add_files(dropped);
        }
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui) {
        ui.heading("Files");
        ui.separator();

        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let fill = if hovering {
            egui::Color32::from_rgb(40, 70, 110)
        } else {
            ui.visuals().extreme_bg_color
        };

        let zone = egui::Button::new("Drop HEIC files or folders here\n(click to browse)")
            .fill(fill)
            .min_size(egui::vec2(ui.available_width(), 80.0));

        if ui.add_enabled(!self.is_converting, zone).clicked() {
            if let Some(paths) = rfd::FileDialog::new()
                .add_filter("Images", heic_converter::conversion::SUPPORTED_INPUT_EXTENSIONS)
                .pick_files()
            {
                self.add_files(paths);
            }
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_converting, egui::Button::new("Add Folder..."))
                .clicked()
            {
                if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                    self.add_files(vec![folder]);
                }
            }
        });

        ui.add_space(10.0);
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.separator();

        ui.add_enabled_ui(!self.is_converting, |ui| {
            ui.horizontal(|ui| {
                ui.label("Output format:");
                egui::ComboBox::from_id_salt("output_format")
                    .selected_text(self.output_format.label())
                    .show_ui(ui, |ui| {
                        for format in OutputFormat::ALL {
                            ui.selectable_value(&mut self.output_format, format, format.label());
                        }
                    });
            });

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.create_subfolder, "Create subfolder");
                ui.checkbox(&mut self.auto_open, "Auto-open when done");
            });
        });

        ui.add_space(10.0);
    }

    fn render_file_list(&mut self, ui: &mut egui::Ui) {
        if !self.status_message.is_empty() {
            ui.label(&self.status_message);
        }
        if !self.error_message.is_empty() {
            ui.colored_label(egui::Color32::RED, &self.error_message);
        }

        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 60.0).max(100.0))
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("file_rows")
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        for row in &self.files.rows {
                            ui.label(display_name(&row.path))
                                .on_hover_text(row.path.display().to_string());
                            ui.add(
                                egui::ProgressBar::new(row.progress)
                                    .desired_width(150.0)
                                    .show_percentage(),
                            );
                            ui.label(&row.status);
                            ui.end_row();
                        }
                    });
            });
    }

    fn render_buttons(&mut self, ui: &mut egui::Ui) {
        ui.separator();

        ui.horizontal(|ui| {
            let button_text = if self.is_converting { "Stop" } else { "Convert" };
            let button = egui::Button::new(button_text).min_size(egui::vec2(200.0, 40.0));

            if ui.add(button).clicked() {
                if self.is_converting {
                    self.stop_conversion();
                } else {
                    self.start_conversion(ui.ctx());
                }
            }

            let clear = egui::Button::new("Clear").min_size(egui::vec2(100.0, 40.0));
            if ui.add_enabled(!self.is_converting, clear).clicked() {
                self.files.clear();
                self.status_message.clear();
                self.error_message.clear();
            }
        });
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for progress updates from background thread
        self.check_progress();
        self.handle_dropped_files(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("HEIC Converter");
            ui.label("Convert HEIC and other images to JPG or PNG");
            ui.add_space(20.0);

            self.render_drop_zone(ui);
            self.render_settings(ui);
            self.render_file_list(ui);
            self.render_buttons(ui);
        });

        // Request repaint if converting
        if self.is_converting {
            ctx.request_repaint();
        }
    }
}

impl Drop for ConverterApp {
    fn drop(&mut self) {
        if let Some(stop) = &self.stop_handle {
            stop.stop();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.progress_receiver = None;
    }
}
