//! E2E tests for `jirastat`: bootstrap, a curated run, config, and failures.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn jirastat_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jirastat"));
    cmd.current_dir(dir);
    cmd.env("JIRASTAT_LOG", "error");
    cmd.env("FORMAT", "json");
    cmd.env_remove("JIRASTAT_FLOW_POLICY");
    cmd.env_remove("JIRASTAT_TIMING");
    cmd.env_remove("DEBUG");
    cmd
}

fn write_export(dir: &Path, name: &str) {
    let export = json!({
        "issues": [
            {
                "key": "PRJ-1",
                "fields": {
                    "created": "2024-01-01T08:15:00.000+0000",
                    "status": {"name": "Done"},
                    "priority": {"name": "High"}
                },
                "changelog": {"histories": [
                    {"created": "2024-01-03T10:00:00.000+0000", "items": [
                        {"field": "status", "fromString": "Open", "toString": "In Progress"}
                    ]},
                    {"created": "2024-01-05T09:00:00.000+0000", "items": [
                        {"field": "status", "fromString": "In Progress", "toString": "Done"},
                        {"field": "priority", "fromString": "Low", "toString": "High"}
                    ]}
                ]}
            },
            {
                "key": "PRJ-2",
                "fields": {
                    "created": "2024-01-02T12:00:00.000+0000",
                    "status": {"name": "Open"}
                }
            }
        ]
    });
    fs::write(dir.join(name), serde_json::to_string_pretty(&export).expect("json"))
        .expect("write export");
}

fn write_matrix(dir: &Path) {
    fs::write(
        dir.join("in-out_config.json"),
        r#"{"Open": {"In Progress": "OUT"}, "In Progress": {"Done": "IN"}}"#,
    )
    .expect("write matrix");
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("jirastat should not crash");
    assert!(
        output.status.success(),
        "jirastat failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("summary must be valid JSON")
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[test]
fn missing_matrix_bootstraps_and_writes_no_tables() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");

    let summary = run_json(&mut jirastat_cmd(dir.path()));
    assert_eq!(summary["outcome"], "bootstrapped");
    assert_eq!(summary["labels"], 3);
    assert_eq!(summary["tickets"], 2);

    let template = fs::read_to_string(dir.path().join("in-out_config.json")).expect("template");
    let matrix: Value = serde_json::from_str(&template).expect("template is JSON");
    assert_eq!(matrix["Open"]["In Progress"], "IGNORE");
    assert_eq!(matrix["Done"]["Done"], "IGNORE");

    assert!(!dir.path().join("stat_status.csv").exists());
    assert!(!dir.path().join("in-out_flow.csv").exists());
}

#[test]
fn bootstrap_template_is_identical_across_fresh_runs() {
    let first = TempDir::new().expect("tempdir");
    let second = TempDir::new().expect("tempdir");
    for dir in [&first, &second] {
        write_export(dir.path(), "output.json");
        jirastat_cmd(dir.path()).assert().success();
    }

    let a = fs::read(first.path().join("in-out_config.json")).expect("first template");
    let b = fs::read(second.path().join("in-out_config.json")).expect("second template");
    assert_eq!(a, b);
}

#[test]
fn pretty_bootstrap_message_mentions_matrix() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");

    jirastat_cmd(dir.path())
        .env("FORMAT", "pretty")
        .assert()
        .success()
        .stdout(predicate::str::contains("in-out_config.json"))
        .stdout(predicate::str::contains("IN, OUT, INOUT or IGNORE"));
}

// ---------------------------------------------------------------------------
// Completed runs
// ---------------------------------------------------------------------------

#[test]
fn curated_matrix_writes_both_tables() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    write_matrix(dir.path());

    let summary = run_json(&mut jirastat_cmd(dir.path()));
    assert_eq!(summary["outcome"], "completed");
    assert_eq!(summary["field"], "status");
    assert_eq!(summary["policy"], "simple");
    assert_eq!(summary["flow_in"], 1);
    assert_eq!(summary["flow_out"], 1);

    let stat = fs::read_to_string(dir.path().join("stat_status.csv")).expect("stat csv");
    let lines: Vec<&str> = stat.lines().collect();
    assert_eq!(lines[0], "Date,Done,In Progress,Open");
    assert_eq!(lines[1], "2024-01-01,0,0,1");
    assert_eq!(lines[2], "2024-01-02,0,0,2");
    assert_eq!(lines[6], "2024-01-06,1,0,1");

    let flow = fs::read_to_string(dir.path().join("in-out_flow.csv")).expect("flow csv");
    assert_eq!(flow, "Date,IN,OUT\n2024-01-03,0,1\n2024-01-05,1,0\n");
}

#[test]
fn custom_input_and_field() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "export.json");
    fs::write(dir.path().join("in-out_config.json"), "{}").expect("write matrix");

    let summary = run_json(jirastat_cmd(dir.path()).args(["export.json", "priority"]));
    assert_eq!(summary["field"], "priority");

    let stat = fs::read_to_string(dir.path().join("stat_priority.csv")).expect("stat csv");
    let lines: Vec<&str> = stat.lines().collect();
    // PRJ-2 has no priority at all; it counts under the unset marker.
    assert_eq!(lines[0], "Date,(none),High,Low");
    assert_eq!(lines[1], "2024-01-01,0,0,1");
    assert_eq!(lines[2], "2024-01-02,1,0,1");
    assert_eq!(lines[6], "2024-01-06,1,1,0");

    let flow = fs::read_to_string(dir.path().join("in-out_flow.csv")).expect("flow csv");
    assert_eq!(flow, "Date,IN,OUT\n");
}

#[test]
fn net_direction_policy_from_config_file() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    write_matrix(dir.path());
    fs::write(
        dir.path().join("jirastat.toml"),
        "[flow]\npolicy = \"net-direction\"\n\n[output]\ndir = \"reports\"\n",
    )
    .expect("write config");

    let summary = run_json(&mut jirastat_cmd(dir.path()));
    assert_eq!(summary["policy"], "net-direction");

    let flow = fs::read_to_string(dir.path().join("reports/in-out_flow.csv")).expect("flow csv");
    let lines: Vec<&str> = flow.lines().collect();
    assert_eq!(lines[0], "Date,IN,OUT");
    assert_eq!(lines[1], "2024-01-03,0,1");
    assert_eq!(lines[2], "2024-01-04,0,0");
    assert_eq!(lines[3], "2024-01-05,1,0");
    assert!(lines.len() > 4, "net-direction rows run through today");
    assert!(!dir.path().join("in-out_flow.csv").exists());
}

#[test]
fn env_policy_overrides_config_file() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    write_matrix(dir.path());
    fs::write(dir.path().join("jirastat.toml"), "[flow]\npolicy = \"net-direction\"\n")
        .expect("write config");

    let summary = run_json(jirastat_cmd(dir.path()).env("JIRASTAT_FLOW_POLICY", "simple"));
    assert_eq!(summary["policy"], "simple");
    assert_eq!(summary["flow_rows"], 2);
}

#[test]
fn timing_report_goes_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    write_matrix(dir.path());

    jirastat_cmd(dir.path())
        .env("JIRASTAT_TIMING", "1")
        .assert()
        .success()
        .stderr(predicate::str::contains("stage.snapshot"))
        .stderr(predicate::str::contains("stage.export"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn missing_input_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");

    jirastat_cmd(dir.path())
        .env("FORMAT", "text")
        .arg("nope.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"))
        .stderr(predicate::str::contains("nope.json"));

    assert!(!dir.path().join("in-out_config.json").exists());
}

#[test]
fn invalid_matrix_action_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    fs::write(
        dir.path().join("in-out_config.json"),
        r#"{"Open": {"Done": "SIDEWAYS"}}"#,
    )
    .expect("write matrix");

    let output = jirastat_cmd(dir.path()).output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let json_end = stderr.find("\n}\n").map_or(stderr.len(), |i| i + 2);
    let error: Value = serde_json::from_str(&stderr[..json_end]).expect("JSON error on stderr");
    assert_eq!(error["error"]["error_code"], "E2001");
    assert!(!dir.path().join("stat_status.csv").exists());
}

#[test]
fn unknown_env_policy_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), "output.json");
    write_matrix(dir.path());

    jirastat_cmd(dir.path())
        .env("FORMAT", "text")
        .env("JIRASTAT_FLOW_POLICY", "hourly")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1102]"));
}
