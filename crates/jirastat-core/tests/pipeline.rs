//! End-to-end tests over small issue exports: extraction, timelines,
//! snapshots, bootstrap, and both flow policies.

use chrono::{Duration, NaiveDate};
use jirastat_core::event::{FieldHistory, extract_all, midnight_utc};
use jirastat_core::flow::{FlowAction, FlowPolicy, FlowRow, TransitionMatrix};
use jirastat_core::model::IssueDocument;
use jirastat_core::pipeline::{RunOptions, RunOutcome, analyze, run};
use jirastat_core::timeline::Timeline;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn date(raw: &str) -> NaiveDate {
    raw.parse().expect("valid date")
}

/// Created 2024-01-01, Open -> In Progress on 01-03, In Progress -> Done on 01-05.
fn reference_export() -> Value {
    json!({
        "issues": [{
            "key": "PRJ-1",
            "fields": {
                "created": "2024-01-01T08:15:00.000+0000",
                "status": {"name": "Done"}
            },
            "changelog": {"histories": [
                {"created": "2024-01-03T10:00:00.000+0000", "items": [
                    {"field": "status", "fromString": "Open", "toString": "In Progress"}
                ]},
                {"created": "2024-01-05T09:00:00.000+0000", "items": [
                    {"field": "status", "fromString": "In Progress", "toString": "Done"}
                ]}
            ]}
        }]
    })
}

fn reference_matrix() -> TransitionMatrix {
    serde_json::from_value(json!({
        "Open": {"In Progress": "OUT"},
        "In Progress": {"Done": "IN"}
    }))
    .expect("valid matrix")
}

fn histories(export: Value, field: &str) -> Vec<FieldHistory> {
    let doc: IssueDocument = serde_json::from_value(export).expect("valid export");
    let tickets = doc.into_tickets().expect("valid tickets");
    extract_all(&tickets, field)
}

fn write_export(dir: &Path, export: &Value) -> std::path::PathBuf {
    let path = dir.join("output.json");
    std::fs::write(&path, serde_json::to_string(export).expect("json")).expect("write export");
    path
}

fn options(dir: &Path, today: &str) -> RunOptions {
    RunOptions {
        input: dir.join("output.json"),
        field: "status".to_string(),
        matrix_path: dir.join("in-out_config.json"),
        output_dir: dir.to_path_buf(),
        policy: FlowPolicy::Simple,
        today: date(today),
    }
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

#[test]
fn reference_ticket_state_by_day() {
    let histories = histories(reference_export(), "status");
    let timeline = Timeline::reconstruct(&histories[0]);

    // State in effect at the end of each day.
    let end_of = |d: &str| midnight_utc(date(d)) + Duration::days(1) - Duration::seconds(1);
    let state = |d: &str| {
        timeline
            .state_as_of(end_of(d))
            .map(ToString::to_string)
            .expect("ticket exists")
    };

    assert_eq!(state("2024-01-01"), "Open");
    assert_eq!(state("2024-01-02"), "Open");
    assert_eq!(state("2024-01-03"), "In Progress");
    assert_eq!(state("2024-01-04"), "In Progress");
    assert_eq!(state("2024-01-05"), "Done");
    assert_eq!(state("2024-03-01"), "Done");
    assert!(timeline.state_as_of(midnight_utc(date("2023-12-31"))).is_none());
}

#[test]
fn structured_current_value_without_history() {
    let export = json!({
        "issues": [{
            "key": "PRJ-2",
            "fields": {"created": "2024-02-01T12:00:00.000+0000", "status": {"name": "Closed"}},
            "changelog": {"histories": [
                {"created": "2024-02-02T12:00:00.000+0000", "items": [
                    {"field": "assignee", "fromString": null, "toString": "kim"}
                ]}
            ]}
        }]
    });

    let histories = histories(export, "status");
    let timeline = Timeline::reconstruct(&histories[0]);
    assert_eq!(timeline.facts().len(), 1);
    assert_eq!(timeline.facts()[0].label.as_str(), "Closed");
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn snapshot_counts_at_start_of_each_day() {
    let analysis = analyze(
        &histories(reference_export(), "status"),
        &reference_matrix(),
        FlowPolicy::Simple,
        date("2024-01-07"),
    );

    let snapshot = &analysis.snapshot;
    let labels: Vec<_> = snapshot.labels.iter().map(|l| l.as_str()).collect();
    assert_eq!(labels, ["Done", "In Progress", "Open"]);
    assert_eq!(snapshot.rows.len(), 7);

    // Counted at midnight: a transition shows up on the following day's row.
    let expected = [
        ("2024-01-01", "Open"),
        ("2024-01-02", "Open"),
        ("2024-01-03", "Open"),
        ("2024-01-04", "In Progress"),
        ("2024-01-05", "In Progress"),
        ("2024-01-06", "Done"),
        ("2024-01-07", "Done"),
    ];
    for (day, label) in expected {
        assert_eq!(snapshot.count(date(day), label), Some(1), "{day}");
        assert_eq!(snapshot.row(date(day)).map(|r| r.total()), Some(1), "{day}");
    }
}

#[test]
fn empty_export_produces_empty_tables() {
    let analysis = analyze(
        &histories(json!({"issues": []}), "status"),
        &TransitionMatrix::new(),
        FlowPolicy::NetDirection,
        date("2024-01-07"),
    );
    assert!(analysis.snapshot.is_empty());
    assert!(analysis.flow.is_empty());
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

#[test]
fn simple_tally_reference() {
    let analysis = analyze(
        &histories(reference_export(), "status"),
        &reference_matrix(),
        FlowPolicy::Simple,
        date("2024-01-20"),
    );

    assert_eq!(
        analysis.flow.rows,
        [
            FlowRow { date: date("2024-01-03"), inflow: 0, outflow: 1 },
            FlowRow { date: date("2024-01-05"), inflow: 1, outflow: 0 },
        ]
    );
}

#[test]
fn net_direction_reference() {
    let today = date("2024-01-20");
    let analysis = analyze(
        &histories(reference_export(), "status"),
        &reference_matrix(),
        FlowPolicy::NetDirection,
        today,
    );

    let rows = &analysis.flow.rows;
    assert_eq!(rows.first().map(|r| r.date), Some(date("2024-01-03")));
    assert_eq!(rows.last().map(|r| r.date), Some(today));
    assert_eq!(rows.len(), 18);
    for pair in rows.windows(2) {
        assert_eq!(pair[1].date, pair[0].date + Duration::days(1));
    }

    for row in rows {
        let expected = match row.date.to_string().as_str() {
            "2024-01-03" => (0, 1),
            "2024-01-05" => (1, 0),
            _ => (0, 0),
        };
        assert_eq!((row.inflow, row.outflow), expected, "{}", row.date);
    }
}

#[test]
fn unmapped_transitions_are_ignored() {
    let mut matrix = TransitionMatrix::new();
    matrix.set("Open", "Done", FlowAction::In);

    let analysis = analyze(
        &histories(reference_export(), "status"),
        &matrix,
        FlowPolicy::Simple,
        date("2024-01-20"),
    );
    assert!(analysis.flow.is_empty());
}

// ---------------------------------------------------------------------------
// Runs against the filesystem
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_is_idempotent_and_writes_no_tables() {
    let mut templates = Vec::new();

    for _ in 0..2 {
        let dir = TempDir::new().expect("tempdir");
        write_export(dir.path(), &reference_export());

        let outcome = run(&options(dir.path(), "2024-01-20")).expect("run");
        let RunOutcome::Bootstrapped { labels, tickets, .. } = outcome else {
            panic!("expected bootstrap, got {outcome:?}");
        };
        assert_eq!(labels, 3);
        assert_eq!(tickets, 1);

        assert!(!dir.path().join("stat_status.csv").exists());
        assert!(!dir.path().join("in-out_flow.csv").exists());

        let template = std::fs::read_to_string(dir.path().join("in-out_config.json"))
            .expect("template written");
        templates.push(template);
    }

    assert_eq!(templates[0], templates[1]);
    let matrix: TransitionMatrix = serde_json::from_str(&templates[0]).expect("valid template");
    assert_eq!(matrix.active_pairs(), 0);
    assert_eq!(matrix.len(), 3);
}

#[test]
fn second_run_after_curation_writes_both_tables() {
    let dir = TempDir::new().expect("tempdir");
    write_export(dir.path(), &reference_export());
    let opts = options(dir.path(), "2024-01-06");

    assert!(matches!(run(&opts).expect("bootstrap"), RunOutcome::Bootstrapped { .. }));

    std::fs::write(
        &opts.matrix_path,
        serde_json::to_string_pretty(&reference_matrix()).expect("json"),
    )
    .expect("curate matrix");

    let RunOutcome::Completed(report) = run(&opts).expect("run") else {
        panic!("expected a completed run");
    };
    assert_eq!(report.tickets, 1);
    assert_eq!(report.snapshot_days, 6);
    assert_eq!((report.flow_in, report.flow_out), (1, 1));

    let stat = std::fs::read_to_string(dir.path().join("stat_status.csv")).expect("stat csv");
    let mut lines = stat.lines();
    assert_eq!(lines.next(), Some("Date,Done,In Progress,Open"));
    assert_eq!(lines.next(), Some("2024-01-01,0,0,1"));
    assert_eq!(stat.lines().count(), 7);

    let flow = std::fs::read_to_string(dir.path().join("in-out_flow.csv")).expect("flow csv");
    assert_eq!(flow, "Date,IN,OUT\n2024-01-03,0,1\n2024-01-05,1,0\n");
}

#[test]
fn non_default_field_names_the_snapshot_file() {
    let dir = TempDir::new().expect("tempdir");
    let export = json!({
        "issues": [{
            "key": "PRJ-3",
            "fields": {"created": "2024-01-01", "priority": {"name": "High"}}
        }]
    });
    write_export(dir.path(), &export);
    std::fs::write(dir.path().join("in-out_config.json"), "{}").expect("matrix");

    let mut opts = options(dir.path(), "2024-01-02");
    opts.field = "priority".to_string();

    let RunOutcome::Completed(report) = run(&opts).expect("run") else {
        panic!("expected a completed run");
    };
    assert_eq!(report.snapshot_path, dir.path().join("stat_priority.csv"));
    let stat = std::fs::read_to_string(&report.snapshot_path).expect("stat csv");
    assert_eq!(stat, "Date,High\n2024-01-01,1\n2024-01-02,1\n");
}

#[test]
fn bad_timestamp_aborts_the_run() {
    let dir = TempDir::new().expect("tempdir");
    let export = json!({
        "issues": [{"key": "PRJ-4", "fields": {"created": "31/12/2023"}}]
    });
    write_export(dir.path(), &export);

    let err = run(&options(dir.path(), "2024-01-02")).unwrap_err();
    assert!(err.to_string().contains("PRJ-4"));
    assert!(!dir.path().join("in-out_config.json").exists());
}
