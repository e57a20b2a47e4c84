//! Daily IN/OUT tallies under a named aggregation policy.
//!
//! # Policies
//!
//! - [`FlowPolicy::Simple`]: each classified transition counts once on its
//!   own date. `INOUT` counts on both sides. Only dates with at least one
//!   counted transition get a row.
//! - [`FlowPolicy::NetDirection`]: transitions are first summed per ticket
//!   and date, then each (ticket, date) contributes a single unit in its net
//!   direction, or one unit to both sides on a tie. Every date from the
//!   first counted transition through `today` gets a row, zero-filled.
//!
//! Transitions classified `IGNORE` never create a row under either policy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classify::ClassifiedEvent;
use crate::error::StatError;

/// How classified transitions become daily counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowPolicy {
    #[default]
    Simple,
    NetDirection,
}

impl FlowPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::NetDirection => "net-direction",
        }
    }
}

impl fmt::Display for FlowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowPolicy {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "tally" => Ok(Self::Simple),
            "net-direction" | "net_direction" | "net" => Ok(Self::NetDirection),
            _ => Err(StatError::UnknownPolicy(s.to_string())),
        }
    }
}

impl Serialize for FlowPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FlowPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// IN/OUT counts for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowRow {
    pub date: NaiveDate,
    #[serde(rename = "in")]
    pub inflow: usize,
    #[serde(rename = "out")]
    pub outflow: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowTable {
    pub policy: FlowPolicy,
    /// Ascending by date, one row per date at most.
    pub rows: Vec<FlowRow>,
}

impl FlowTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, date: NaiveDate) -> Option<&FlowRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Sum of IN and OUT over all rows.
    #[must_use]
    pub fn totals(&self) -> (usize, usize) {
        self.rows
            .iter()
            .fold((0, 0), |(i, o), r| (i + r.inflow, o + r.outflow))
    }
}

/// Aggregate classified transitions under `policy`.
///
/// `today` bounds the zero-filled range of [`FlowPolicy::NetDirection`];
/// the simple tally ignores it.
#[must_use]
pub fn aggregate_flow(
    events: &[ClassifiedEvent<'_>],
    policy: FlowPolicy,
    today: NaiveDate,
) -> FlowTable {
    let rows = match policy {
        FlowPolicy::Simple => simple_tally(events),
        FlowPolicy::NetDirection => net_direction(events, today),
    };
    debug!(%policy, rows = rows.len(), "flow table built");
    FlowTable { policy, rows }
}

fn simple_tally(events: &[ClassifiedEvent<'_>]) -> Vec<FlowRow> {
    let mut daily: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for event in events.iter().filter(|e| !e.action.is_ignore()) {
        let slot = daily.entry(event.date()).or_default();
        if event.action.counts_in() {
            slot.0 += 1;
        }
        if event.action.counts_out() {
            slot.1 += 1;
        }
    }

    daily
        .into_iter()
        .map(|(date, (inflow, outflow))| FlowRow {
            date,
            inflow,
            outflow,
        })
        .collect()
}

fn net_direction(events: &[ClassifiedEvent<'_>], today: NaiveDate) -> Vec<FlowRow> {
    let mut per_ticket: BTreeMap<(NaiveDate, &str), (usize, usize)> = BTreeMap::new();
    for event in events.iter().filter(|e| !e.action.is_ignore()) {
        let slot = per_ticket.entry((event.date(), event.key)).or_default();
        if event.action.counts_in() {
            slot.0 += 1;
        }
        if event.action.counts_out() {
            slot.1 += 1;
        }
    }

    let Some(&(start, _)) = per_ticket.keys().next() else {
        return Vec::new();
    };

    let mut daily: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for ((date, _), (ins, outs)) in per_ticket {
        let slot = daily.entry(date).or_default();
        match ins.cmp(&outs) {
            std::cmp::Ordering::Greater => slot.0 += 1,
            std::cmp::Ordering::Less => slot.1 += 1,
            std::cmp::Ordering::Equal => {
                slot.0 += 1;
                slot.1 += 1;
            }
        }
    }

    start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| {
            let (inflow, outflow) = daily.get(&date).copied().unwrap_or_default();
            FlowRow {
                date,
                inflow,
                outflow,
            }
        })
        .collect()
}
