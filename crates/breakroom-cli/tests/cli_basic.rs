//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a temporary home
//! directory so no real user state is touched.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with an isolated home and return output.
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "breakroom-cli", "--quiet", "--"])
        .args(args)
        .env("HOME", home)
        .env("BREAKROOM_ENV", "dev")
        .output()
        .expect("failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Breakroom CLI"));
}

#[test]
fn test_config_path_is_under_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(".config/breakroom-dev/config.toml"));
    assert!(stdout.starts_with(home.path().to_str().unwrap()));
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "idle_threshold_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "180");
}

#[test]
fn test_config_set_roundtrip() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["config", "set", "idle_threshold_secs", "240"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "idle_threshold_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "240");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "no_such_key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_tier_list_shows_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["tier", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Stretch"));
    assert!(stdout.contains("Walk"));
}

#[test]
fn test_tier_add_and_remove() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &[
            "tier",
            "add",
            "Micro",
            "--interval-mins",
            "10",
            "--break-secs",
            "10",
            "--color",
            "blue",
        ],
    );
    assert_eq!(code, 0, "tier add failed: {stdout}");

    let (stdout, _, _) = run_cli(home.path(), &["tier", "list"]);
    assert!(stdout.contains("Micro"));

    let (_, _, code) = run_cli(home.path(), &["tier", "remove", "Micro"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(home.path(), &["tier", "list"]);
    assert!(!stdout.contains("Micro"));
}

#[test]
fn test_tier_remove_unknown_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["tier", "remove", "Nonexistent"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no such tier"));
}

#[test]
fn test_exception_add_and_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        home.path(),
        &["exception", "add", "us.zoom.xos", "Zoom", "--trigger", "opened"],
    );
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["exception", "list", "--json"]);
    assert_eq!(code, 0);
    let rules: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rules[0]["app_id"], "us.zoom.xos");
    assert_eq!(rules[0]["trigger"], "opened");
}

#[test]
fn test_log_show_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["log", "show", "--json"]);
    assert_eq!(code, 0);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 0);
}

#[test]
fn test_simulate_demo_runs_a_full_cycle() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["simulate"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("scenario: demo"));
    assert!(stdout.contains("BreakStarted"));
    assert!(stdout.contains("OverlayLocked"));
    assert!(stdout.contains("BreakEnded"));
}
