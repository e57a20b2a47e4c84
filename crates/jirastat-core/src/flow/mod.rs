//! Flow reporting: classify transitions with the operator's matrix, then
//! tally them per day.

pub mod aggregate;
pub mod classify;
pub mod matrix;

pub use aggregate::{FlowPolicy, FlowRow, FlowTable, aggregate_flow};
pub use classify::{ClassifiedEvent, classify};
pub use matrix::{FlowAction, MatrixState, TransitionMatrix, UnknownFlowAction, load_or_bootstrap};
