//! Input model: the issue export document, parsed tickets, and state labels.

pub mod ticket;
pub mod value;

pub use ticket::{IssueDocument, RawChangeItem, RawChangelog, RawHistory, RawIssue, Ticket};
pub use value::{StateLabel, StateValue, UNSET_LABEL};
