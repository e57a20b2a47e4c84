//! Change events and per-field extraction.
//!
//! A [`ChangeEvent`] is one changelog item as exported, for any field. The
//! extractor narrows a ticket's history to a single tracked field and turns
//! it into label-level [`Transition`]s.

pub mod extract;
pub mod timestamp;

pub use extract::{FieldHistory, extract_all, extract_field};
pub use timestamp::{Instant, TimestampError, midnight_utc, parse_timestamp};

use chrono::NaiveDate;

use crate::model::StateLabel;

/// One raw changelog item. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub instant: Instant,
    /// Field id the item changed (`status`, `customfield_10010`, ...).
    pub field: String,
    /// `fromString` as exported.
    pub from: Option<String>,
    /// `toString` as exported.
    pub to: Option<String>,
}

/// A change of the tracked field, reduced to labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub instant: Instant,
    pub from: StateLabel,
    pub to: StateLabel,
}

impl Transition {
    /// Calendar date of the transition, in the offset it was recorded in.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.instant.date_naive()
    }
}
