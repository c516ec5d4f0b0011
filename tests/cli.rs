//! End-to-end tests of the `harscope` binary.
//!
//! Each test points the binary at its own sessions directory, so separate
//! invocations share state only through the on-disk descriptor.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn harscope(sessions: &Path) -> Command {
    let mut cmd = Command::cargo_bin("harscope").unwrap();
    cmd.env_remove("HARSCOPE_CONFIG")
        .env_remove("HARSCOPE_LOG_LEVEL")
        .env_remove("RUST_BACKTRACE")
        .arg("--sessions-dir")
        .arg(sessions);
    cmd
}

/// A sessions directory with the demo capture loaded.
fn loaded() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    harscope(dir.path())
        .arg("load")
        .arg(fixture_path("demo.har"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 4 | Errors: 2"));
    dir
}

#[test]
fn test_help() {
    Command::cargo_bin("harscope")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("expand"));
}

#[test]
fn test_overview_before_load_is_guidance() {
    let dir = tempfile::tempdir().unwrap();
    harscope(dir.path())
        .arg("overview")
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("No capture loaded"));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    harscope(dir.path())
        .args(["load", "does-not-exist.har"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.har"));
}

#[test]
fn test_list_across_invocations() {
    let dir = loaded();
    harscope(dir.path())
        .args(["list", "--status", "4xx"])
        .assert()
        .success()
        .stdout("[e1] POST /login 401\n");
}

#[test]
fn test_detail_section() {
    let dir = loaded();
    harscope(dir.path())
        .args(["detail", "e1", "--section", "response.body"])
        .assert()
        .success()
        .stdout("{\"error\":\"invalid credentials\"}\n");
}

#[test]
fn test_detail_out_of_range() {
    let dir = loaded();
    harscope(dir.path())
        .args(["detail", "e99"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Entry e99 not found."));
}

#[test]
fn test_expand_bogus_ref() {
    let dir = loaded();
    harscope(dir.path())
        .args(["expand", "bogus"])
        .assert()
        .code(64)
        .stderr(predicate::str::starts_with("Error: Invalid ref format: bogus"));
}

#[test]
fn test_expand_section() {
    let dir = loaded();
    harscope(dir.path())
        .args(["expand", "e0.request.query"])
        .assert()
        .success()
        .stdout("page: 1\n");
}

#[test]
fn test_analyze_unknown_type() {
    let dir = loaded();
    harscope(dir.path())
        .args(["analyze", "perf"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Unknown analysis type: perf"));
}

#[test]
fn test_export_writes_sanitized_capture() {
    let dir = loaded();
    let out = dir.path().join("clean.har");
    harscope(dir.path())
        .args(["export", "--sanitize", "--domain", "api.example.com", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Export plan: 3 of 4 entries"))
        .stdout(predicate::str::contains("Wrote 3 entries to"));

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("[REDACTED]"));
    assert!(!written.contains("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhZGEifQ"));
}

#[test]
fn test_sessions_lists_active() {
    let dir = loaded();
    harscope(dir.path())
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("* "))
        .stdout(predicate::str::contains("4 entries"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("harscope")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harscope"));
}
