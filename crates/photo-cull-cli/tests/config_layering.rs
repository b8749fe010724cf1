//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use photo_cull_test_support::{write_png, SyntheticImageBuilder};
use predicates::prelude::*;

fn photo_cull(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-cull").unwrap();
    cmd.current_dir(home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

fn sharp_png(dir: &Path) -> PathBuf {
    write_png(dir, "sharp.png", &SyntheticImageBuilder::sharp_photo()).unwrap()
}

fn write_project_config(dir: &Path, content: &str) {
    fs::write(dir.join(".photo-cull.toml"), content).unwrap();
}

#[test]
fn test_project_config_applies_format() {
    let temp_dir = tempfile::tempdir().unwrap();
    let photo = sharp_png(temp_dir.path());
    write_project_config(
        temp_dir.path(),
        r"
[output]
format = 'json'

[detector]
enabled = false
",
    );

    photo_cull(temp_dir.path())
        .arg(&photo)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let photo = sharp_png(temp_dir.path());
    write_project_config(
        temp_dir.path(),
        r"
[output]
format = 'json'
",
    );

    photo_cull(temp_dir.path())
        .arg("--format")
        .arg("jsonl")
        .arg("--no-detector")
        .arg(&photo)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_relaxes_subject_and_threshold() {
    let temp_dir = tempfile::tempdir().unwrap();
    let photo = sharp_png(temp_dir.path());
    write_project_config(
        temp_dir.path(),
        r"
[selection]
require_subject = false
sharpness_threshold = 1.0

[detector]
enabled = false

[sidecar]
enabled = false
",
    );

    photo_cull(temp_dir.path())
        .arg(&photo)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"selected\":true"));
    assert!(!temp_dir.path().join("sharp.xmp").exists());
}

#[test]
fn test_project_config_found_in_parent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("shoot/day1");
    fs::create_dir_all(&nested).unwrap();
    let photo = sharp_png(&nested);
    write_project_config(
        temp_dir.path(),
        r"
[selection]
sharpness_threshold = 100000.0
require_subject = false
",
    );

    photo_cull(&nested)
        .arg("--no-detector")
        .arg(&photo)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("not sharp enough"));
}

#[test]
fn test_xdg_config_is_lowest_priority() {
    let temp_dir = tempfile::tempdir().unwrap();
    let photo = sharp_png(temp_dir.path());
    let xdg = temp_dir.path().join("config/photo-cull");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(
        xdg.join("config.toml"),
        r"
[output]
format = 'json'

[selection]
require_subject = false
",
    )
    .unwrap();
    write_project_config(
        temp_dir.path(),
        r"
[output]
format = 'jsonl'
",
    );

    photo_cull(temp_dir.path())
        .arg("--no-detector")
        .arg("--no-sidecars")
        .arg(&photo)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("no subject").not());
}

#[test]
fn test_invalid_config_value_warns_and_falls_back() {
    let temp_dir = tempfile::tempdir().unwrap();
    let photo = sharp_png(temp_dir.path());
    write_project_config(
        temp_dir.path(),
        r"
[selection]
brightness_min = 400.0
",
    );

    photo_cull(temp_dir.path())
        .arg("--no-detector")
        .arg("--no-sidecars")
        .arg(&photo)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("brightness_min must be 0-255"));
}
