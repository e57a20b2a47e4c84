//! Continuous-time state history of one ticket.
//!
//! A [`Timeline`] is built from a [`FieldHistory`]: the initial state at
//! midnight UTC of the creation date, followed by the target state of every
//! transition. Facts are kept sorted by instant so that
//! [`Timeline::state_as_of`] is a binary search.

use chrono::NaiveDate;
use tracing::warn;

use crate::event::{FieldHistory, Instant, midnight_utc};
use crate::model::StateLabel;

/// "From this instant on, the ticket was in this state."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub instant: Instant,
    pub label: StateLabel,
}

/// Ordered state facts for one ticket. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    key: String,
    facts: Vec<Fact>,
}

impl Timeline {
    /// Build the timeline of one ticket.
    ///
    /// The creation fact is anchored at midnight UTC of the creation date,
    /// so a ticket counts for the whole day it was created. The sort is
    /// stable: the creation fact precedes a transition at the same instant,
    /// and same-instant transitions keep extraction order.
    #[must_use]
    pub fn reconstruct(history: &FieldHistory) -> Self {
        let anchor = midnight_utc(history.created.date_naive());

        let mut facts = Vec::with_capacity(history.transitions.len() + 1);
        facts.push(Fact {
            instant: anchor,
            label: history.initial.clone(),
        });
        for t in &history.transitions {
            if t.instant < anchor {
                warn!(
                    key = %history.key,
                    at = %t.instant.to_rfc3339(),
                    "transition recorded before the ticket's creation date"
                );
            }
            facts.push(Fact {
                instant: t.instant,
                label: t.to.clone(),
            });
        }
        facts.sort_by_key(|f| f.instant);

        Self {
            key: history.key.clone(),
            facts,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// State of the last fact at or before `at`.
    ///
    /// `None` when `at` precedes every fact, i.e. the ticket did not exist
    /// yet. Equal instants resolve to the later fact in sequence order.
    #[must_use]
    pub fn state_as_of(&self, at: Instant) -> Option<&StateLabel> {
        let idx = self.facts.partition_point(|f| f.instant <= at);
        idx.checked_sub(1).map(|i| &self.facts[i].label)
    }

    /// Earliest calendar date of any fact.
    ///
    /// Dates are taken in each fact's own offset, so this is not always the
    /// date of the first fact.
    #[must_use]
    pub fn first_date(&self) -> NaiveDate {
        self.facts
            .iter()
            .map(|f| f.instant.date_naive())
            .min()
            .unwrap_or(NaiveDate::MAX)
    }

    /// Every label the ticket ever held.
    #[must_use]
    pub fn labels(&self) -> impl Iterator<Item = &StateLabel> {
        self.facts.iter().map(|f| &f.label)
    }
}

/// Reconstruct the timeline of every ticket, preserving order.
#[must_use]
pub fn reconstruct_all(histories: &[FieldHistory]) -> Vec<Timeline> {
    histories.iter().map(Timeline::reconstruct).collect()
}
