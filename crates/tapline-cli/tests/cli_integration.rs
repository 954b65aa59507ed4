use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// A `tapline` command isolated from the caller's config and environment.
fn tapline(home: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("tapline").unwrap();
    cmd.env("HOME", home)
        .env_remove("TAPLINE_WEBDRIVER_URL")
        .env_remove("TAPLINE_SESSION_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn scratch_home() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tapline-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// An address nothing listens on.
fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn test_help_exits_zero() {
    tapline(&scratch_home())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tapline"))
        .stdout(predicate::str::contains("scroll-until"));
}

#[test]
fn test_missing_session_id_is_usage_error() {
    tapline(&scratch_home())
        .args(["tap", "login"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no session id"));
}

#[test]
fn test_invalid_direction_rejected() {
    tapline(&scratch_home())
        .args(["-s", "s1", "swipe", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid direction"));
}

#[test]
fn test_text_wait_without_text_is_usage_error() {
    tapline(&scratch_home())
        .args(["-w", &dead_endpoint(), "-s", "s1", "wait", "text", "status"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("expected text"));
}

#[test]
fn test_sleep_needs_no_device() {
    tapline(&scratch_home())
        .args(["-w", &dead_endpoint(), "-s", "s1", "sleep", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wait ok"));
}

#[test]
fn test_sleep_needs_no_session_id() {
    tapline(&scratch_home())
        .args(["sleep", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wait ok"));
}

#[test]
fn test_sleep_json_output() {
    tapline(&scratch_home())
        .args(["-w", &dead_endpoint(), "-s", "s1", "-f", "json", "sleep", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"interaction\": \"wait\""))
        .stdout(predicate::str::contains("\"status\": \"success\""));
}

#[test]
fn test_unreachable_endpoint_is_connection_error() {
    tapline(&scratch_home())
        .args(["-w", &dead_endpoint(), "-s", "s1", "tap", "login"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Connection error"));
}

#[test]
fn test_record_appends_json_lines() {
    let home = scratch_home();
    let record = home.join(format!("record-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&record);

    for _ in 0..2 {
        tapline(&home)
            .args(["-w", &dead_endpoint(), "-s", "s1", "-q", "--record"])
            .arg(&record)
            .args(["sleep", "1"])
            .assert()
            .success();
    }

    let contents = std::fs::read_to_string(&record).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.lines().all(|l| l.contains("\"interaction\":\"wait\"")));
    let _ = std::fs::remove_file(&record);
}

#[test]
fn test_unwritable_record_keeps_interaction_result() {
    let home = scratch_home();
    // A directory cannot be opened for appending.
    let record = home.join(format!("record-dir-{}", std::process::id()));
    std::fs::create_dir_all(&record).unwrap();

    tapline(&home)
        .arg("--record")
        .arg(&record)
        .args(["sleep", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wait ok"))
        .stderr(predicate::str::contains("could not append interaction record"));

    tapline(&home)
        .args(["-w", &dead_endpoint(), "-s", "s1", "--record"])
        .arg(&record)
        .args(["tap", "login"])
        .assert()
        .code(2);

    let _ = std::fs::remove_dir(&record);
}

#[test]
fn test_completions_need_no_session() {
    tapline(&scratch_home())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tapline"));
}
