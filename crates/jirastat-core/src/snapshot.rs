//! Daily state snapshots.
//!
//! For every calendar day from the earliest fact in the dataset through
//! `today`, count how many tickets were in each state at the start of that
//! day (midnight UTC). Columns are the same on every row: every label ever
//! observed, in byte order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::event::midnight_utc;
use crate::model::StateLabel;
use crate::timeline::Timeline;

/// Counts for one day, aligned with [`SnapshotTable::labels`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub date: NaiveDate,
    pub counts: Vec<usize>,
}

impl SnapshotRow {
    /// Tickets counted on this day, across all labels.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotTable {
    pub labels: Vec<StateLabel>,
    pub rows: Vec<SnapshotRow>,
}

impl SnapshotTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, date: NaiveDate) -> Option<&SnapshotRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Count for `label` on `date`; `None` if either is not in the table.
    #[must_use]
    pub fn count(&self, date: NaiveDate, label: &str) -> Option<usize> {
        let col = self.labels.iter().position(|l| l.as_str() == label)?;
        self.row(date).map(|r| r.counts[col])
    }
}

/// Build the snapshot table for `timelines`.
///
/// Empty input, or an earliest date after `today`, yields an empty table.
#[must_use]
pub fn aggregate_snapshots(timelines: &[Timeline], today: NaiveDate) -> SnapshotTable {
    let Some(start) = timelines.iter().map(Timeline::first_date).min() else {
        return SnapshotTable::default();
    };

    let labels: Vec<StateLabel> = timelines
        .iter()
        .flat_map(Timeline::labels)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rows = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= today) {
        let at = midnight_utc(date);
        let mut counts = vec![0_usize; labels.len()];

        for timeline in timelines {
            let Some(label) = timeline.state_as_of(at) else {
                continue;
            };
            debug!(key = timeline.key(), %date, state = %label, "snapshot match");
            if let Ok(col) = labels.binary_search(label) {
                counts[col] += 1;
            }
        }

        rows.push(SnapshotRow { date, counts });
    }

    debug!(
        days = rows.len(),
        labels = labels.len(),
        tickets = timelines.len(),
        "snapshot table built"
    );

    SnapshotTable { labels, rows }
}
