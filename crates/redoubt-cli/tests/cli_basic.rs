//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway HOME so
//! real user state is never touched.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "redoubt-cli", "--quiet", "--"])
        .args(args)
        .env("HOME", home)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn session_status_starts_idle() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["session", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no active session"));
}

#[test]
fn session_start_and_end() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["session", "start", "Deep work", "--minutes", "30"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Deep work"));

    let (stdout, _, code) = run_cli(home.path(), &["session", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Deep work"));

    let (stdout, _, code) = run_cli(home.path(), &["session", "end"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("session ended"));
}

#[test]
fn hardcore_session_refuses_end_without_password() {
    let home = tempfile::tempdir().unwrap();
    run_cli(
        home.path(),
        &["session", "start", "Locked", "--minutes", "30", "--hardcore"],
    );
    let (_, stderr, code) = run_cli(home.path(), &["session", "end"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error"));
}

#[test]
fn weak_password_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["password", "set", "short"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error"));

    let (stdout, _, code) = run_cli(home.path(), &["password", "set", "longenough1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("master password set"));

    let (stdout, _, code) = run_cli(home.path(), &["password", "verify", "longenough1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("true"));
}

#[test]
fn schedule_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        home.path(),
        &[
            "schedule", "add", "Mornings", "--start", "09:00", "--end", "12:00", "--days",
            "mon,wed",
        ],
    );
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["schedule", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Mornings"));
    assert!(stdout.contains("09:00-12:00"));
}

#[test]
fn pomodoro_status_is_json_parsable() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["pomodoro", "status", "--json"]);
    assert_eq!(code, 0);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["phase"], "work");
    assert_eq!(state["is_running"], false);
}
