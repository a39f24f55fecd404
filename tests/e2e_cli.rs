//! CLI end-to-end tests
//!
//! Tests for multiscreen command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the multiscreen binary
#[allow(deprecated)]
fn multiscreen_cmd() -> Command {
    let mut cmd = Command::cargo_bin("multiscreen").unwrap();
    cmd.env("RUST_LOG", "multiscreen=warn");
    cmd
}

/// Write a config with two static monitors and the given extra TOML.
fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("multiscreen.toml");
    let content = format!(
        r#"
[playback]
mode = "loop"
fullscreen_delay_ms = 0

[[monitors]]
x = 0
y = 0
width = 1920
height = 1080

[[monitors]]
x = 1920
y = 0
width = 1280
height = 1024
{extra}"#
    );
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = multiscreen_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("multiscreen"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("multiscreen"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("mpv"))
        .stdout(predicate::str::contains("xrandr"));
}

#[test]
fn test_cli_resolve_directory_json() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.mp4"), b"").unwrap();
    fs::write(dir.path().join("a.mkv"), b"").unwrap();
    fs::write(dir.path().join("readme.txt"), b"").unwrap();

    let mut cmd = multiscreen_cmd();
    cmd.arg("resolve")
        .arg(dir.path())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.mkv"))
        .stdout(predicate::str::contains("b.mp4"))
        .stdout(predicate::str::contains("readme.txt").not());
}

#[test]
fn test_cli_resolve_missing_source_fails() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("resolve")
        .arg("/definitely/not/here.mp4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_resolve_unsupported_extension_fails() {
    let dir = tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, b"").unwrap();

    let mut cmd = multiscreen_cmd();
    cmd.arg("resolve")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported extension"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "\n[[assignments]]\nsource = \"/srv/lobby.m3u\"\nscreen = 2\nmode = \"shuffle\"\n",
    );

    let mut cmd = multiscreen_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Monitors: 2 static"))
        .stdout(predicate::str::contains("screen 2 <- /srv/lobby.m3u (shuffle)"));
}

#[test]
fn test_cli_validate_rejects_screen_zero() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "\n[[assignments]]\nsource = \"/srv/lobby.m3u\"\nscreen = 0\n",
    );

    let mut cmd = multiscreen_cmd();
    cmd.arg("validate").arg(&config).assert().failure();
}

#[test]
fn test_cli_monitors_from_static_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = multiscreen_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("monitors")
        .assert()
        .success()
        .stdout(predicate::str::contains("1: 1920x1080+0+0"))
        .stdout(predicate::str::contains("2: 1280x1024+1920+0"));
}

#[test]
fn test_cli_play_dry_run_reports_skipped_assignment() {
    let dir = tempdir().unwrap();
    let video = dir.path().join("intro.mp4");
    fs::write(&video, b"").unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = multiscreen_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("play")
        .arg("--dry-run")
        .arg("--assign")
        .arg(format!("1={}", video.display()))
        .arg("--assign")
        .arg(format!("2={}", dir.path().join("missing.mp4").display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 2 assignment(s) played"))
        .stdout(predicate::str::contains("stopped"))
        .stderr(predicate::str::contains("skipped screen 2"))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_play_nothing_playable_exit_code() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = multiscreen_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("play")
        .arg("--dry-run")
        .arg("--assign")
        .arg("3=/definitely/not/here.mp4")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_cli_play_rejects_malformed_assignment() {
    let mut cmd = multiscreen_cmd();
    cmd.arg("play")
        .arg("--dry-run")
        .arg("--assign")
        .arg("intro.mp4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SCREEN=SOURCE"));
}

#[test]
fn test_cli_play_without_assignments_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = multiscreen_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("play")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to play"));
}

#[test]
fn test_cli_play_monitor_enumeration_failure_exit_code() {
    let dir = tempdir().unwrap();
    let empty_path = dir.path().join("bin");
    fs::create_dir(&empty_path).unwrap();
    let config = dir.path().join("detect.toml");
    fs::write(
        &config,
        "[[assignments]]\nscreen = 1\nsource = \"/videos/intro.mp4\"\n",
    )
    .unwrap();

    // No [[monitors]] and no xrandr on PATH
    let mut cmd = multiscreen_cmd();
    cmd.env("PATH", &empty_path)
        .arg("--config")
        .arg(&config)
        .arg("play")
        .arg("--dry-run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("monitor enumeration failed"));
}
