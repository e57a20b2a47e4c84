//! jirastat-core library.
//!
//! Turns a JIRA issue export into two daily reports: how many issues sat in
//! each state at the start of every day, and how many transitions crossed a
//! tracked boundary (IN/OUT) on each day.
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`error::StatError`]; every
//!   failure aborts the run.
//! - **Logging**: use `tracing` macros. Per-event traces and per-day
//!   snapshot matches go to `debug!`, stage summaries to `info!`.

pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod flow;
pub mod model;
pub mod pipeline;
pub mod snapshot;
pub mod timeline;
pub mod timing;
