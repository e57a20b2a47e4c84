use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::event::timestamp::TimestampError;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputReadFailed,
    InputParseError,
    MissingField,
    InvalidTimestamp,
    ConfigParseError,
    UnknownFlowPolicy,
    MatrixParseError,
    MatrixWriteFailed,
    ReportWriteFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputReadFailed => "E1001",
            Self::InputParseError => "E1002",
            Self::MissingField => "E1003",
            Self::InvalidTimestamp => "E1004",
            Self::ConfigParseError => "E1101",
            Self::UnknownFlowPolicy => "E1102",
            Self::MatrixParseError => "E2001",
            Self::MatrixWriteFailed => "E2002",
            Self::ReportWriteFailed => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputReadFailed => "Input file could not be read",
            Self::InputParseError => "Input file is not a valid issue export",
            Self::MissingField => "Issue is missing a required field",
            Self::InvalidTimestamp => "Unparseable timestamp",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownFlowPolicy => "Unknown flow aggregation policy",
            Self::MatrixParseError => "Transition matrix parse error",
            Self::MatrixWriteFailed => "Transition matrix write failed",
            Self::ReportWriteFailed => "Report write failed",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputReadFailed => {
                Some("Pass the path of the exported JSON as the first argument.")
            }
            Self::InputParseError => {
                Some("Re-export the issues with their changelog expanded and retry.")
            }
            Self::MissingField | Self::InvalidTimestamp => None,
            Self::ConfigParseError => Some("Fix syntax in jirastat.toml and retry."),
            Self::UnknownFlowPolicy => Some("Use `simple` or `net-direction`."),
            Self::MatrixParseError => Some(
                "Every matrix entry must be one of IN, OUT, INOUT, IGNORE. \
                 Delete the file to regenerate a template.",
            ),
            Self::MatrixWriteFailed | Self::ReportWriteFailed => {
                Some("Check disk space and write permissions.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every failure a run can hit. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a valid issue export: {source}", path.display())]
    InputJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("issue {key}: missing required field '{field}'")]
    MissingField { key: String, field: String },

    #[error("issue {key}: {source}")]
    Timestamp {
        key: String,
        #[source]
        source: TimestampError,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown flow policy '{0}': expected `simple` or `net-direction`")]
    UnknownPolicy(String),

    #[error("transition matrix {} is invalid: {source}", path.display())]
    Matrix {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write transition matrix {}: {source}", path.display())]
    MatrixWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StatError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::InputReadFailed,
            Self::InputJson { .. } => ErrorCode::InputParseError,
            Self::MissingField { .. } => ErrorCode::MissingField,
            Self::Timestamp { .. } => ErrorCode::InvalidTimestamp,
            Self::Config { .. } => ErrorCode::ConfigParseError,
            Self::UnknownPolicy(_) => ErrorCode::UnknownFlowPolicy,
            Self::Matrix { .. } => ErrorCode::MatrixParseError,
            Self::MatrixWrite { .. } => ErrorCode::MatrixWriteFailed,
            Self::Report { .. } => ErrorCode::ReportWriteFailed,
        }
    }
}
