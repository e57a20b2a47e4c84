//! Table-driven classification of transitions.

use chrono::NaiveDate;
use tracing::debug;

use super::matrix::{FlowAction, TransitionMatrix};
use crate::event::{FieldHistory, Transition};

/// A transition paired with the action the matrix assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedEvent<'a> {
    /// Key of the ticket the transition belongs to.
    pub key: &'a str,
    pub transition: &'a Transition,
    pub action: FlowAction,
}

impl ClassifiedEvent<'_> {
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.transition.date()
    }
}

/// Classify every transition of every ticket.
///
/// `IGNORE` results are kept so callers see the full event set; the
/// aggregators skip them. Pairs missing from the matrix are `IGNORE` and are
/// never added to it.
#[must_use]
pub fn classify<'a>(
    histories: &'a [FieldHistory],
    matrix: &TransitionMatrix,
) -> Vec<ClassifiedEvent<'a>> {
    let mut out = Vec::new();
    for history in histories {
        for transition in &history.transitions {
            let action = matrix.action(transition.from.as_str(), transition.to.as_str());
            if !action.is_ignore() {
                debug!(
                    key = %history.key,
                    date = %transition.date(),
                    from = %transition.from,
                    to = %transition.to,
                    %action,
                    "classified transition"
                );
            }
            out.push(ClassifiedEvent {
                key: &history.key,
                transition,
                action,
            });
        }
    }
    out
}
