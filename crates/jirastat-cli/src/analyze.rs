//! The one command: build both reports from an issue export.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use jirastat_core::config;
use jirastat_core::error::StatError;
use jirastat_core::pipeline::{self, RunOptions, RunOutcome, RunReport};

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_error};

/// What to analyse, as given on the command line.
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub input: PathBuf,
    pub field: String,
}

/// Execute a run and print its summary.
pub fn run_analyze(
    args: &AnalyzeArgs,
    output: OutputMode,
    project_root: &Path,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let outcome = match resolve_options(args, project_root, today).and_then(|o| pipeline::run(&o)) {
        Ok(outcome) => outcome,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(anyhow::Error::new(err).context(format!("{} run failed", args.field)));
        }
    };

    render(output, &outcome, write_text, write_pretty)
}

/// Merge the project config and CLI arguments into run options.
fn resolve_options(
    args: &AnalyzeArgs,
    project_root: &Path,
    today: NaiveDate,
) -> Result<RunOptions, StatError> {
    let config = config::resolve_config(project_root)?;
    Ok(RunOptions {
        input: project_root.join(&args.input),
        field: args.field.clone(),
        matrix_path: config.matrix_path(project_root),
        output_dir: config.output_dir(project_root),
        policy: config.flow.policy,
        today,
    })
}

fn write_text(outcome: &RunOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    match outcome {
        RunOutcome::Bootstrapped {
            matrix_path,
            labels,
            tickets,
        } => writeln!(
            w,
            "bootstrapped matrix={} labels={labels} issues={tickets}",
            matrix_path.display()
        ),
        RunOutcome::Completed(report) => {
            writeln!(
                w,
                "completed field={} issues={} policy={}",
                report.field, report.tickets, report.policy
            )?;
            writeln!(
                w,
                "snapshot path={} days={} labels={}",
                report.snapshot_path.display(),
                report.snapshot_days,
                report.labels.len()
            )?;
            writeln!(
                w,
                "flow path={} rows={} in={} out={}",
                report.flow_path.display(),
                report.flow_rows,
                report.flow_in,
                report.flow_out
            )
        }
    }
}

fn write_pretty(outcome: &RunOutcome, w: &mut dyn Write) -> std::io::Result<()> {
    match outcome {
        RunOutcome::Bootstrapped {
            matrix_path,
            labels,
            tickets,
        } => {
            pretty_section(w, "Transition matrix template written")?;
            pretty_kv(w, "Matrix", matrix_path.display().to_string())?;
            pretty_kv(w, "Labels", labels.to_string())?;
            pretty_kv(w, "Issues", tickets.to_string())?;
            writeln!(w)?;
            writeln!(
                w,
                "Set each entry to IN, OUT, INOUT or IGNORE, then run jirastat again."
            )
        }
        RunOutcome::Completed(report) => write_pretty_report(report, w),
    }
}

fn write_pretty_report(report: &RunReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("jirastat: {}", report.field))?;
    pretty_kv(w, "Issues", report.tickets.to_string())?;
    pretty_kv(w, "Labels", report.labels.join(", "))?;
    writeln!(w)?;

    pretty_section(w, "Snapshot")?;
    pretty_kv(w, "File", report.snapshot_path.display().to_string())?;
    pretty_kv(w, "Days", report.snapshot_days.to_string())?;
    writeln!(w)?;

    pretty_section(w, "Flow")?;
    pretty_kv(w, "File", report.flow_path.display().to_string())?;
    pretty_kv(w, "Policy", report.policy.as_str())?;
    pretty_kv(w, "Rows", report.flow_rows.to_string())?;
    pretty_kv(w, "IN", report.flow_in.to_string())?;
    pretty_kv(w, "OUT", report.flow_out.to_string())
}
