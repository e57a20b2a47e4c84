//! One run, end to end.
//!
//! ```text
//! export JSON ─▶ tickets ─▶ field histories ─┬─▶ timelines ─▶ snapshot table
//!                                            └─▶ classified ─▶ flow table
//!                                                    ▲
//!                                     transition matrix (or bootstrap)
//! ```
//!
//! The matrix is resolved before any table is built: when it has to be
//! bootstrapped the run stops there and writes nothing else.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::StatError;
use crate::event::{FieldHistory, extract_all};
use crate::export;
use crate::flow::{self, FlowPolicy, FlowTable, MatrixState, TransitionMatrix};
use crate::model::IssueDocument;
use crate::snapshot::{SnapshotTable, aggregate_snapshots};
use crate::timeline::reconstruct_all;
use crate::timing;

/// Inputs of a run, fully resolved.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub field: String,
    pub matrix_path: PathBuf,
    pub output_dir: PathBuf,
    pub policy: FlowPolicy,
    /// Last day of the dense tables.
    pub today: NaiveDate,
}

/// Both tables, in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub snapshot: SnapshotTable,
    pub flow: FlowTable,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The matrix was missing; a template was written for the operator.
    Bootstrapped {
        matrix_path: PathBuf,
        labels: usize,
        tickets: usize,
    },
    /// Both tables were written.
    Completed(RunReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub field: String,
    pub tickets: usize,
    pub policy: FlowPolicy,
    pub snapshot_path: PathBuf,
    pub snapshot_days: usize,
    pub labels: Vec<String>,
    pub flow_path: PathBuf,
    pub flow_rows: usize,
    pub flow_in: usize,
    pub flow_out: usize,
}

/// Build both tables from extracted histories.
#[must_use]
pub fn analyze(
    histories: &[FieldHistory],
    matrix: &TransitionMatrix,
    policy: FlowPolicy,
    today: NaiveDate,
) -> Analysis {
    let snapshot = timing::timed("stage.snapshot", || {
        aggregate_snapshots(&reconstruct_all(histories), today)
    });
    let flow = timing::timed("stage.flow", || {
        flow::aggregate_flow(&flow::classify(histories, matrix), policy, today)
    });
    Analysis { snapshot, flow }
}

/// Execute a full run against the filesystem.
///
/// # Errors
///
/// Any [`StatError`] aborts the run. A missing matrix is not an error: it
/// yields [`RunOutcome::Bootstrapped`].
pub fn run(opts: &RunOptions) -> Result<RunOutcome, StatError> {
    let tickets = timing::timed("stage.load", || {
        IssueDocument::load(&opts.input)?.into_tickets()
    })?;
    info!(
        input = %opts.input.display(),
        tickets = tickets.len(),
        field = %opts.field,
        "loaded issue export"
    );

    let histories = timing::timed("stage.extract", || extract_all(&tickets, &opts.field));

    let matrix = match flow::load_or_bootstrap(&opts.matrix_path, &histories)? {
        MatrixState::Loaded(matrix) => matrix,
        MatrixState::Bootstrapped { path, matrix } => {
            return Ok(RunOutcome::Bootstrapped {
                matrix_path: path,
                labels: matrix.len(),
                tickets: tickets.len(),
            });
        }
    };

    let Analysis { snapshot, flow } = analyze(&histories, &matrix, opts.policy, opts.today);

    let (snapshot_path, flow_path) = timing::timed("stage.export", || {
        let snapshot_path = export::save_snapshot(&snapshot, &opts.output_dir, &opts.field)?;
        let flow_path = export::save_flow(&flow, &opts.output_dir)?;
        Ok::<_, StatError>((snapshot_path, flow_path))
    })?;

    let (flow_in, flow_out) = flow.totals();
    Ok(RunOutcome::Completed(RunReport {
        field: opts.field.clone(),
        tickets: tickets.len(),
        policy: opts.policy,
        snapshot_path,
        snapshot_days: snapshot.rows.len(),
        labels: snapshot.labels.iter().map(ToString::to_string).collect(),
        flow_path,
        flow_rows: flow.rows.len(),
        flow_in,
        flow_out,
    }))
}
