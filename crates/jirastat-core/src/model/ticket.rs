//! Issue export document and the parsed [`Ticket`] entity.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StatError;
use crate::event::ChangeEvent;
use crate::event::timestamp::{Instant, parse_timestamp};

/// Top level of an issue export: `{"issues": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueDocument {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// One issue exactly as exported.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub changelog: Option<RawChangelog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChangelog {
    #[serde(default)]
    pub histories: Option<Vec<RawHistory>>,
}

/// One changelog entry: a timestamp and the field changes made at it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHistory {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<RawChangeItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChangeItem {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "fromString", default)]
    pub from_string: Option<String>,
    #[serde(rename = "toString", default)]
    pub to_string: Option<String>,
}

impl IssueDocument {
    /// Read and deserialize an export from disk.
    ///
    /// # Errors
    ///
    /// Returns [`StatError::Read`] if the file cannot be read and
    /// [`StatError::InputJson`] if it is not a well-formed export.
    pub fn load(path: &Path) -> Result<Self, StatError> {
        let content = std::fs::read_to_string(path).map_err(|source| StatError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StatError::InputJson {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse every issue into a [`Ticket`].
    ///
    /// # Errors
    ///
    /// Fails on the first issue with a missing creation time or an
    /// unparseable timestamp. No issue is skipped.
    pub fn into_tickets(self) -> Result<Vec<Ticket>, StatError> {
        self.issues.into_iter().map(Ticket::from_raw).collect()
    }
}

/// A tracked issue with its full, parsed change history.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub key: String,
    pub created: Instant,
    /// Current field values, keyed by field id.
    pub fields: Map<String, Value>,
    /// Every change item in export order (history order, then item order).
    pub history: Vec<ChangeEvent>,
}

impl Ticket {
    /// Parse a raw issue.
    ///
    /// Every history timestamp is parsed, not only those touching the field
    /// later analyzed, so a malformed export fails the same way regardless
    /// of the field chosen.
    ///
    /// # Errors
    ///
    /// Returns [`StatError::MissingField`] when `fields.created` or a
    /// history `created` is absent and [`StatError::Timestamp`] when one
    /// cannot be parsed.
    pub fn from_raw(raw: RawIssue) -> Result<Self, StatError> {
        let RawIssue {
            key,
            fields,
            changelog,
        } = raw;

        let created_raw = fields
            .get("created")
            .and_then(Value::as_str)
            .ok_or_else(|| StatError::MissingField {
                key: key.clone(),
                field: "created".to_string(),
            })?;
        let created = parse_timestamp(created_raw).map_err(|source| StatError::Timestamp {
            key: key.clone(),
            source,
        })?;

        let histories = changelog.and_then(|c| c.histories).unwrap_or_default();
        let mut history = Vec::new();
        for entry in histories {
            let Some(created_at) = entry.created.as_deref() else {
                return Err(StatError::MissingField {
                    key,
                    field: "changelog.histories[].created".to_string(),
                });
            };
            let instant = parse_timestamp(created_at).map_err(|source| StatError::Timestamp {
                key: key.clone(),
                source,
            })?;

            for item in entry.items.unwrap_or_default() {
                history.push(ChangeEvent {
                    instant,
                    field: item.field.unwrap_or_default(),
                    from: item.from_string,
                    to: item.to_string,
                });
            }
        }

        debug!(key = %key, changes = history.len(), "parsed issue");

        Ok(Self {
            key,
            created,
            fields,
            history,
        })
    }

    /// Current value of a field, if present.
    #[must_use]
    pub fn field(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id)
    }
}
