//! Narrow a ticket's history to one field.

use tracing::debug;

use super::timestamp::Instant;
use super::{ChangeEvent, Transition};
use crate::model::{StateLabel, StateValue, Ticket};

/// Everything the aggregators need to know about one ticket and one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHistory {
    pub key: String,
    pub created: Instant,
    /// State at creation, see [`extract_field`].
    pub initial: StateLabel,
    /// Changes of the field, ascending by instant.
    pub transitions: Vec<Transition>,
}

/// Extract the history of `field_id` from a ticket.
///
/// Transitions are sorted by instant with a stable sort, so changes sharing
/// an instant keep their export order. The export itself does not guarantee
/// that order is meaningful.
///
/// The initial state is the `from` of the earliest transition when it has
/// one. Otherwise it falls back to the ticket's current value, which is only
/// an approximation of the state at creation when the earliest transition
/// starts from an empty value.
#[must_use]
pub fn extract_field(ticket: &Ticket, field_id: &str) -> FieldHistory {
    let mut transitions: Vec<Transition> = ticket
        .history
        .iter()
        .filter(|change| change.field == field_id)
        .map(to_transition)
        .collect();
    transitions.sort_by_key(|t| t.instant);

    let initial = match transitions.first() {
        Some(first) if !first.from.is_unset() => first.from.clone(),
        _ => StateValue::normalize(ticket.field(field_id)),
    };

    for t in &transitions {
        debug!(
            key = %ticket.key,
            at = %t.instant.to_rfc3339(),
            from = %t.from,
            to = %t.to,
            "transition"
        );
    }

    FieldHistory {
        key: ticket.key.clone(),
        created: ticket.created,
        initial,
        transitions,
    }
}

/// Extract `field_id` for every ticket, preserving ticket order.
#[must_use]
pub fn extract_all(tickets: &[Ticket], field_id: &str) -> Vec<FieldHistory> {
    tickets
        .iter()
        .map(|ticket| extract_field(ticket, field_id))
        .collect()
}

fn to_transition(change: &ChangeEvent) -> Transition {
    Transition {
        instant: change.instant,
        from: StateLabel::from_optional(change.from.as_deref()),
        to: StateLabel::from_optional(change.to.as_deref()),
    }
}
