//! The operator-curated transition matrix.
//!
//! `matrix[from][to]` names what a transition means for the flow report:
//! entering the tracked boundary (`IN`), leaving it (`OUT`), both (`INOUT`),
//! or nothing (`IGNORE`). Pairs missing from the matrix are `IGNORE`.
//!
//! On first use the matrix file does not exist. [`load_or_bootstrap`] then
//! writes an all-`IGNORE` template covering every observed label and the run
//! stops so an operator can fill it in. The program never writes to an
//! existing matrix.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StatError;
use crate::event::FieldHistory;
use crate::model::StateLabel;

/// What a transition contributes to the flow report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowAction {
    In,
    Out,
    InOut,
    #[default]
    Ignore,
}

/// Error returned when parsing an unknown action string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flow action '{raw}': expected one of IN, OUT, INOUT, IGNORE")]
pub struct UnknownFlowAction {
    pub raw: String,
}

impl FlowAction {
    pub const ALL: [Self; 4] = [Self::In, Self::Out, Self::InOut, Self::Ignore];

    /// Canonical spelling used in the matrix file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::InOut => "INOUT",
            Self::Ignore => "IGNORE",
        }
    }

    #[must_use]
    pub const fn counts_in(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    #[must_use]
    pub const fn counts_out(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }

    #[must_use]
    pub const fn is_ignore(self) -> bool {
        matches!(self, Self::Ignore)
    }
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowAction {
    type Err = UnknownFlowAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "INOUT" => Ok(Self::InOut),
            "IGNORE" => Ok(Self::Ignore),
            _ => Err(UnknownFlowAction { raw: s.to_string() }),
        }
    }
}

// Matrix files are hand-edited: accept any case, always write upper case.
impl Serialize for FlowAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FlowAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// `from -> to -> action`, with sorted keys for stable files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionMatrix {
    rows: BTreeMap<String, BTreeMap<String, FlowAction>>,
}

impl TransitionMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Square all-`IGNORE` matrix over `labels`.
    #[must_use]
    pub fn template<'a>(labels: impl IntoIterator<Item = &'a StateLabel>) -> Self {
        let labels: BTreeSet<&str> = labels.into_iter().map(StateLabel::as_str).collect();
        let rows = labels
            .iter()
            .map(|from| {
                let row = labels
                    .iter()
                    .map(|to| ((*to).to_string(), FlowAction::Ignore))
                    .collect();
                ((*from).to_string(), row)
            })
            .collect();
        Self { rows }
    }

    /// Template over every label seen as the source or target of a
    /// transition.
    #[must_use]
    pub fn bootstrap(histories: &[FieldHistory]) -> Self {
        Self::template(
            histories
                .iter()
                .flat_map(|h| &h.transitions)
                .flat_map(|t| [&t.from, &t.to]),
        )
    }

    /// Set the action for one pair, creating the row if needed.
    pub fn set(&mut self, from: &str, to: &str, action: FlowAction) {
        self.rows
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), action);
    }

    /// Action for `from -> to`; `IGNORE` when either key is absent.
    #[must_use]
    pub fn action(&self, from: &str, to: &str) -> FlowAction {
        self.rows
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or_default()
    }

    /// Number of `from` rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pairs mapped to something other than `IGNORE`.
    #[must_use]
    pub fn active_pairs(&self) -> usize {
        self.rows
            .values()
            .flat_map(BTreeMap::values)
            .filter(|a| !a.is_ignore())
            .count()
    }

    /// Pretty JSON as written to disk, with a trailing newline.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails, which string-keyed maps of
    /// unit enums do not.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Load a matrix file. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StatError::Read`] when the file exists but cannot be read
    /// and [`StatError::Matrix`] when its content is not a valid matrix.
    pub fn load(path: &Path) -> Result<Option<Self>, StatError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StatError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StatError::Matrix {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Write the matrix to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StatError::MatrixWrite`] on I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), StatError> {
        let write_err = |source| StatError::MatrixWrite {
            path: path.to_path_buf(),
            source,
        };
        let json = self
            .to_json_pretty()
            .map_err(|err| write_err(io::Error::other(err)))?;
        std::fs::write(path, json).map_err(write_err)
    }
}

/// Outcome of [`load_or_bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixState {
    /// An operator-curated matrix was found.
    Loaded(TransitionMatrix),
    /// No matrix existed; a template was written and the run should stop.
    Bootstrapped {
        path: PathBuf,
        matrix: TransitionMatrix,
    },
}

/// Load the matrix at `path`, or write a template built from `histories`.
///
/// # Errors
///
/// Propagates [`TransitionMatrix::load`] and [`TransitionMatrix::save`]
/// failures.
pub fn load_or_bootstrap(
    path: &Path,
    histories: &[FieldHistory],
) -> Result<MatrixState, StatError> {
    if let Some(matrix) = TransitionMatrix::load(path)? {
        info!(
            path = %path.display(),
            rows = matrix.len(),
            active = matrix.active_pairs(),
            "loaded transition matrix"
        );
        return Ok(MatrixState::Loaded(matrix));
    }

    let matrix = TransitionMatrix::bootstrap(histories);
    matrix.save(path)?;
    info!(
        path = %path.display(),
        labels = matrix.len(),
        "wrote transition matrix template"
    );
    Ok(MatrixState::Bootstrapped {
        path: path.to_path_buf(),
        matrix,
    })
}
