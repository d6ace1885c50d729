//! CLI end-to-end tests
//!
//! Tests for the heic-converter command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the heic-converter binary
#[allow(deprecated)]
fn converter_cmd() -> Command {
    Command::cargo_bin("heic-converter").unwrap()
}

fn write_png(path: &Path) {
    image::RgbaImage::from_pixel(6, 4, image::Rgba([10, 200, 30, 128]))
        .save(path)
        .unwrap();
}

#[test]
fn test_cli_no_args_shows_usage() {
    let mut cmd = converter_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = converter_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("heic-converter"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_cli_rejects_unknown_format() {
    let mut cmd = converter_cmd();
    cmd.args(["--format", "gif", "a.heic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_cli_no_heic_files_exits_with_error() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("photo.png"));

    let mut cmd = converter_cmd();
    cmd.arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No HEIC files found in directory"))
        .stderr(predicate::str::contains("No HEIC files found to convert"));
}

#[test]
fn test_cli_missing_input_warns() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.heic");

    let mut cmd = converter_cmd();
    cmd.arg(&missing)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Input path does not exist"));
}

#[test]
fn test_cli_all_formats_converts_png_to_jpg() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_png(&input);

    let mut cmd = converter_cmd();
    cmd.args(["--all-formats", "--format", "jpg"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converting 1 files to JPG..."))
        .stdout(predicate::str::contains("Successfully converted"))
        .stdout(predicate::str::contains("Conversion complete!"));

    let output = dir.path().join("photo.jpg");
    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    assert_eq!(image::open(&output).unwrap().color(), image::ColorType::Rgb8);
}

#[test]
fn test_cli_output_and_subfolder() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_png(&input);

    let mut cmd = converter_cmd();
    cmd.args(["--all-formats", "--format", "png", "--subfolder"])
        .arg(&input)
        .assert()
        .success();
    assert!(dir.path().join("converted_png/photo.png").exists());

    let out = dir.path().join("out");
    let mut cmd = converter_cmd();
    cmd.args(["--all-formats", "--output"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success();
    assert!(out.join("photo.jpg").exists());
}

#[test]
fn test_cli_failed_file_sets_exit_code() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.png");
    let bad = dir.path().join("bad.png");
    write_png(&good);
    fs::write(&bad, b"not an image").unwrap();

    let mut cmd = converter_cmd();
    cmd.arg("--all-formats")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error converting"))
        .stdout(predicate::str::contains("Failed to convert: 1"));

    assert!(dir.path().join("good.jpg").exists());
    assert!(!dir.path().join("bad.jpg").exists());
}

#[test]
fn test_cli_dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_png(&input);

    let mut cmd = converter_cmd();
    cmd.args(["--all-formats", "--dry-run", "--subfolder"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would convert"));

    assert!(!dir.path().join("converted_jpg").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_cli_json_progress() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_png(&input);

    let output = converter_cmd()
        .args(["--all-formats", "--json-progress", "--format", "png"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let messages: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(messages.first().unwrap()["type"], "progress");
    assert!(messages.iter().any(|m| m["type"] == "fileconverted"));
    let summary = messages.last().unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["converted"], 1);
    assert_eq!(summary["failed"], 0);
}
