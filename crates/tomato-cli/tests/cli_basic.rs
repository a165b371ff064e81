//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temp
//! directory, so the config file lives there.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &std::path::Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tomato"))
        .args(args)
        .env("HOME", home)
        .env_remove("TOMATO_ENV")
        .env_remove("RUST_LOG")
        .env_remove("XDG_CONFIG_HOME")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_phases_json_lists_default_cycle() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["phases", "--json"]);
    assert_eq!(code, 0, "phases failed");

    let phases: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let phases = phases.as_array().unwrap();
    assert_eq!(phases.len(), 8);
    assert_eq!(phases[0]["kind"], "focus");
    assert_eq!(phases[0]["duration"], 1500);
    assert_eq!(phases[7]["kind"], "long_break");
}

#[test]
fn test_phases_text() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["phases"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Focus"));
    assert!(stdout.contains("25 minutes"));
    assert!(stdout.contains("Long Break"));
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "schedule.focus_duration", "60"]);
    assert_eq!(code, 0, "config set failed");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "schedule.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_rejects_negative_duration() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "schedule.long_break", "-1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("schedule.long_break"));

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "schedule.long_break"]);
    assert_eq!(stdout.trim(), "900");
}

#[test]
fn test_config_rejects_empty_cycle() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["config", "set", "schedule.pomodoros_before_long_break", "0"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("phase sequence is empty"));

    let (stdout, _, _) = run_cli(
        home.path(),
        &["config", "get", "schedule.pomodoros_before_long_break"],
    );
    assert_eq!(stdout.trim(), "4");
}

#[test]
fn test_config_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "schedule.bogus"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_path_is_under_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(".config/tomato"));
}

#[test]
fn test_config_path_follows_xdg_config_home() {
    let home = tempfile::tempdir().unwrap();
    let xdg = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_tomato"))
        .args(["config", "path"])
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", xdg.path())
        .env_remove("TOMATO_ENV")
        .output()
        .expect("Failed to execute CLI command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().starts_with(&*xdg.path().to_string_lossy()));
    assert!(xdg.path().join("tomato").is_dir());
    assert!(!home.path().join(".config").exists());
}
