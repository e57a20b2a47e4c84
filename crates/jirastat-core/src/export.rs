//! CSV export of the snapshot and flow tables.
//!
//! ```text
//! stat_status.csv     Date,Done,In Progress,Open
//!                     2024-01-01,0,0,1
//! in-out_flow.csv     Date,IN,OUT
//!                     2024-01-03,0,1
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use crate::error::StatError;
use crate::flow::FlowTable;
use crate::snapshot::SnapshotTable;

/// File name of the flow table.
pub const FLOW_FILE: &str = "in-out_flow.csv";

/// `stat_<field>.csv`, with characters unsafe in file names replaced.
#[must_use]
pub fn snapshot_file_name(field_id: &str) -> String {
    let safe: String = field_id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("stat_{safe}.csv")
}

/// Write the snapshot table as CSV.
///
/// # Errors
///
/// Propagates writer failures.
pub fn write_snapshot_csv<W: io::Write>(table: &SnapshotTable, out: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(out);

    let mut header = Vec::with_capacity(table.labels.len() + 1);
    header.push("Date");
    header.extend(table.labels.iter().map(|l| l.as_str()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.counts.len() + 1);
        record.push(row.date.to_string());
        record.extend(row.counts.iter().map(ToString::to_string));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the flow table as CSV.
///
/// # Errors
///
/// Propagates writer failures.
pub fn write_flow_csv<W: io::Write>(table: &FlowTable, out: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(["Date", "IN", "OUT"])?;
    for row in &table.rows {
        wtr.write_record([
            row.date.to_string(),
            row.inflow.to_string(),
            row.outflow.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `stat_<field>.csv` into `dir`, returning its path.
///
/// # Errors
///
/// Returns [`StatError::Report`] if the directory or file cannot be written.
pub fn save_snapshot(
    table: &SnapshotTable,
    dir: &Path,
    field_id: &str,
) -> Result<PathBuf, StatError> {
    let path = dir.join(snapshot_file_name(field_id));
    save_with(&path, |file| write_snapshot_csv(table, file))?;
    info!(path = %path.display(), rows = table.rows.len(), "wrote snapshot table");
    Ok(path)
}

/// Write `in-out_flow.csv` into `dir`, returning its path.
///
/// # Errors
///
/// Returns [`StatError::Report`] if the directory or file cannot be written.
pub fn save_flow(table: &FlowTable, dir: &Path) -> Result<PathBuf, StatError> {
    let path = dir.join(FLOW_FILE);
    save_with(&path, |file| write_flow_csv(table, file))?;
    info!(path = %path.display(), rows = table.rows.len(), "wrote flow table");
    Ok(path)
}

fn save_with(
    path: &Path,
    write: impl FnOnce(fs::File) -> Result<(), csv::Error>,
) -> Result<(), StatError> {
    let report_err = |source| StatError::Report {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| report_err(csv::Error::from(err)))?;
    }
    let file = fs::File::create(path).map_err(|err| report_err(csv::Error::from(err)))?;
    write(file).map_err(report_err)
}
