use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_hermit(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hermit"))
        .env("HERMIT_HOME", home)
        .args(args)
        .output()
        .expect("run hermit")
}

fn body(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn session_log(home: &Path, session_id: &str) -> Vec<Value> {
    let path = home.join("sessions").join(format!("{}.jsonl", session_id));
    std::fs::read_to_string(path)
        .expect("session log exists")
        .lines()
        .map(|l| serde_json::from_str(l).expect("log line is JSON"))
        .collect()
}

#[test]
fn bash_run_without_flag_is_denied_with_no_audit_record() {
    let tmp = TempDir::new().unwrap();
    let out = run_hermit(
        tmp.path(),
        &["--tool", "bash_run", "--params", r#"{"command": "ls"}"#],
    );
    assert_eq!(out.status.code(), Some(1));

    let response = body(&out);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["type"], "ApprovalRequired");
    assert_eq!(response["approval_level"], "explicit");
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("bash_run")
    );

    // A denied attempt is indistinguishable from never having happened:
    // only the session's own start marker is on disk.
    let log = session_log(tmp.path(), response["session_id"].as_str().unwrap());
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["type"], "session_start");
}

#[test]
fn bash_run_with_flag_executes_and_is_recorded() {
    let tmp = TempDir::new().unwrap();
    let out = run_hermit(
        tmp.path(),
        &[
            "--auto-approve",
            "--tool",
            "bash_run",
            "--params",
            r#"{"command": "echo approved"}"#,
        ],
    );
    assert!(out.status.success());

    let response = body(&out);
    assert_eq!(response["result"]["stdout"], "approved\n");
    assert_eq!(response["result"]["exit_code"], 0);

    let log = session_log(tmp.path(), response["session_id"].as_str().unwrap());
    assert!(log.iter().any(|e| e["type"] == "tool_call"));
}

#[test]
fn service_stop_is_also_explicit_tier() {
    let tmp = TempDir::new().unwrap();
    let out = run_hermit(
        tmp.path(),
        &[
            "--tool",
            "service_stop",
            "--params",
            r#"{"name": "nginx", "manager": "systemd"}"#,
        ],
    );
    let response = body(&out);
    assert_eq!(response["error"]["type"], "ApprovalRequired");
}

#[test]
fn confirm_tier_executes_immediately() {
    // Nothing in the core blocks confirm-tier tools; confirmation is a
    // protocol convention on the caller's side.
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("note.txt");
    let params = format!(
        r#"{{"path": "{}", "content": "written"}}"#,
        target.display()
    );
    let out = run_hermit(tmp.path(), &["--tool", "file_write", "--params", &params]);
    assert!(out.status.success());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "written");
}

#[test]
fn dry_run_previews_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("never.txt");
    let params = format!(
        r#"{{"path": "{}", "content": "should not exist"}}"#,
        target.display()
    );
    let out = run_hermit(
        tmp.path(),
        &["--dry-run", "--tool", "file_write", "--params", &params],
    );
    assert!(out.status.success());

    let response = body(&out);
    assert_eq!(response["success"], true);
    assert_eq!(response["dry_run"], true);
    assert_eq!(response["result"]["dry_run"], true);
    assert_eq!(response["result"]["would_execute"], "file_write");
    assert_eq!(response["result"]["approval_level"], "confirm");
    assert!(
        response["result"]["params"]["content"]
            .as_str()
            .unwrap()
            .contains("should not exist")
    );
    assert!(!target.exists());
}

#[test]
fn dry_run_does_not_bypass_the_approval_gate() {
    let tmp = TempDir::new().unwrap();
    let out = run_hermit(
        tmp.path(),
        &[
            "--dry-run",
            "--tool",
            "bash_run",
            "--params",
            r#"{"command": "ls"}"#,
        ],
    );
    let response = body(&out);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["type"], "ApprovalRequired");
}
