use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::process::ExitCode;

use heic_converter::cli::Args;
use heic_converter::conversion::codec::{heic_supported, is_heic_file};
use heic_converter::conversion::{discover, BatchEvent, BatchRunner, BatchSummary, FileStage};
use heic_converter::json_output::JsonMessage;
use heic_converter::utils::{
    create_progress_bar, display_name, error_println, format_duration, verbose_println,
    warn_println,
};

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let json = args.json_progress;

    if !json {
        // Print banner
        println!("{}", style("HEIC Converter").bold().blue());
        println!("{}", style("Batch HEIC/HEIF to JPG/PNG conversion").dim());
        println!();
    }

    let options = args.conversion_options();
    let filter = args.input_filter();

    if args.verbose && !json {
        println!("{}", style("Configuration:").bold());
        println!("  Output format: {}", options.output_format.label());
        match &options.output_dir {
            Some(dir) => println!("  Output directory: {}", dir.display()),
            None => println!("  Output directory: next to each input"),
        }
        println!("  Create subfolder: {}", options.create_subfolder);
        println!("  Accepted extensions: {:?}", filter.extensions());
        println!("  JPEG quality: {}", options.jpeg_quality);
        println!("  Dry run: {}", options.dry_run);
        println!("  HEIC decoding available: {}", heic_supported());
        println!();
    }

    let discovery = discover(&args.inputs, filter);
    for warning in &discovery.warnings {
        let message = warning.message(filter);
        if json {
            JsonMessage::progress(0, 0, message);
        } else {
            warn_println(&message);
        }
    }
    verbose_println(args.verbose && !json, &format!("Discovered {}", discovery));

    if discovery.is_empty() {
        if json {
            JsonMessage::summary(0, 0, 0, 0, 0.0);
        } else {
            error_println(&format!("No {} files found to convert", filter.describe()));
        }
        return Ok(ExitCode::from(1));
    }

    if !json && !heic_supported() && discovery.files.iter().any(|p| is_heic_file(p)) {
        warn_println(
            "HEIC decoding is not available in this build, HEIC files will fail (rebuild with --features heif)",
        );
    }

    let files = discovery.files;
    let total = files.len();

    let runner = BatchRunner::new(options).with_compatibility_check(args.all_formats);
    let dry_run = runner.options().dry_run;

    let summary = if json {
        run_json(&runner, &files)
    } else {
        println!(
            "Converting {} files to {}...",
            total,
            runner.options().output_format.label()
        );
        let pb = create_progress_bar(total as u64).context("Failed to create progress bar")?;
        let summary = run_console(&runner, &files, &pb, dry_run, args.verbose);
        pb.finish_and_clear();
        summary
    };

    if json {
        JsonMessage::summary(
            total,
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.duration.as_secs_f64(),
        );
    } else {
        print_summary(&summary, dry_run);
    }

    if summary.has_failures() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Run the batch with an indicatif bar, printing one line per finished file
fn run_console(
    runner: &BatchRunner,
    files: &[PathBuf],
    pb: &ProgressBar,
    dry_run: bool,
    verbose: bool,
) -> BatchSummary {
    runner.run_with_progress(files, |event| match event {
        BatchEvent::Progress { path, stage } => match stage {
            FileStage::Starting => pb.set_message(display_name(&path)),
            FileStage::Converting => {
                if verbose {
                    print_line(
                        pb,
                        format!("{} Decoded {}", style("[VERBOSE]").dim(), path.display()),
                    );
                }
            }
            FileStage::Converted { output_path } => {
                let line = if dry_run {
                    format!(
                        "Would convert: {} -> {}",
                        path.display(),
                        output_path.display()
                    )
                } else {
                    format!("Successfully converted: {}", output_path.display())
                };
                print_line(pb, format!("{} {}", style("✅").green(), line));
                pb.inc(1);
            }
            FileStage::Errored { message } => {
                print_line(
                    pb,
                    format!(
                        "{} Error converting {}: {}",
                        style("❌").red(),
                        path.display(),
                        message
                    ),
                );
                pb.inc(1);
            }
            FileStage::Skipped { message } => {
                print_line(pb, format!("{} {}", style("⚠").yellow(), message));
                pb.inc(1);
            }
        },
        BatchEvent::OutputFolder(dir) => {
            if verbose {
                print_line(
                    pb,
                    format!("{} Output folder: {}", style("[VERBOSE]").dim(), dir.display()),
                );
            }
        }
        BatchEvent::Completed { .. } | BatchEvent::Finished => {}
    })
}

/// Run the batch emitting JSON lines only
fn run_json(runner: &BatchRunner, files: &[PathBuf]) -> BatchSummary {
    let total = files.len();
    let mut current = 0;

    runner.run_with_progress(files, |event| {
        if let BatchEvent::Progress { path, stage } = event {
            match stage {
                FileStage::Starting => {
                    JsonMessage::progress(
                        current,
                        total,
                        format!("Converting {}", display_name(&path)),
                    );
                }
                FileStage::Converted { output_path } => {
                    current += 1;
                    JsonMessage::file_converted(&path, &output_path);
                }
                FileStage::Errored { message } => {
                    current += 1;
                    JsonMessage::file_failed(&path, message);
                }
                FileStage::Skipped { message } => {
                    current += 1;
                    JsonMessage::file_skipped(&path, message);
                }
                FileStage::Converting => {}
            }
        }
    })
}

/// `ProgressBar::println` drops output when the bar is hidden (no terminal)
fn print_line(pb: &ProgressBar, line: String) {
    if pb.is_hidden() {
        println!("{}", line);
    } else {
        pb.println(line);
    }
}

fn print_summary(summary: &BatchSummary, dry_run: bool) {
    println!();
    let header = if dry_run {
        style("Dry run complete!").bold().cyan()
    } else {
        style("Conversion complete!").bold().green()
    };
    println!("{}", header);

    let converted_label = if dry_run {
        "Would be converted"
    } else {
        "Successfully converted"
    };
    println!(
        "{}: {}",
        converted_label,
        style(summary.succeeded).bold().green()
    );
    if summary.failed > 0 {
        println!("Failed to convert: {}", style(summary.failed).bold().red());
    }
    if summary.skipped > 0 {
        println!("Skipped: {}", style(summary.skipped).bold().yellow());
    }
    println!("Time: {}", format_duration(summary.duration));
}
