//! Integration tests for the memory-cli binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli(workspace: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("memory-cli").unwrap();
    cmd.arg("--workspace").arg(workspace);
    cmd
}

#[test]
fn help_lists_every_subcommand() {
    Command::cargo_bin("memory-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("episode"))
        .stdout(predicate::str::contains("fact"))
        .stdout(predicate::str::contains("recall"))
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("task"))
        .stdout(predicate::str::contains("identity"));
}

#[test]
fn record_then_recall_round_trips_through_facts_store() {
    let dir = tempfile::tempdir().unwrap();

    cli(dir.path())
        .args(["episode", "record", "--user", "remember to call the dentist tomorrow", "--agent", "noted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recorded episode"));

    cli(dir.path())
        .args(["recall", "what do I need to do"])
        .assert()
        .success();
}

#[test]
fn schedule_parse_rejects_garbage_expressions() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .args(["schedule", "parse", "not a schedule at all"])
        .assert()
        .failure();
}

#[test]
fn schedule_parse_accepts_daily_token() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .args(["schedule", "parse", "@daily"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next run"));
}

#[test]
fn task_lifecycle_create_list_force_run_delete() {
    let dir = tempfile::tempdir().unwrap();

    cli(dir.path())
        .args([
            "task", "create", "--name", "greeting", "--schedule", "@daily", "--template", "echo",
            "--config", "message=hello from the scheduler",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("created task"));

    let list = cli(dir.path())
        .args(["task", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(list.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let tasks = parsed["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    let id = tasks[0]["id"].as_str().unwrap();

    cli(dir.path())
        .args(["task", "force-run", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("success: hello from the scheduler"));

    cli(dir.path())
        .args(["task", "delete", id])
        .assert()
        .success();

    let list_after = cli(dir.path())
        .args(["task", "list", "--format", "json"])
        .output()
        .unwrap();
    let parsed_after: serde_json::Value = serde_json::from_slice(&list_after.stdout).unwrap();
    assert!(parsed_after["tasks"].as_array().unwrap().is_empty());
}

#[test]
fn task_create_with_unknown_schedule_fails_without_writing_anything() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .args(["task", "create", "--name", "x", "--schedule", "whenever", "--template", "echo", "--config", "message=x"])
        .assert()
        .failure();

    let list = cli(dir.path())
        .args(["task", "list", "--format", "json"])
        .output()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    assert!(parsed["tasks"].as_array().unwrap().is_empty());
}
