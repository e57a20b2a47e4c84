//! Field values and the labels they normalize to.
//!
//! A tracked field is either a bare scalar (`"Open"`, `3`) or a structured
//! object carrying a display name (`{"name": "Open", "id": "1"}`). Both are
//! turned into a [`StateLabel`] once, at ingestion; nothing downstream looks
//! at raw JSON again.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label used for an absent, null, or empty value.
pub const UNSET_LABEL: &str = "(none)";

/// The two shapes a field value takes in an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// A bare value, e.g. `"Open"` or `3`.
    Scalar(String),
    /// A structured value reduced to its display name.
    Named(String),
}

impl StateValue {
    /// Classify a raw JSON value.
    ///
    /// Objects yield their `name` attribute, or `value` for option-style
    /// custom fields. Nulls, arrays, and objects without either attribute
    /// have no usable value.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Scalar(s.clone())),
            Value::Number(n) => Some(Self::Scalar(n.to_string())),
            Value::Bool(b) => Some(Self::Scalar(b.to_string())),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("value"))
                .and_then(Value::as_str)
                .map(|name| Self::Named(name.to_string())),
            Value::Null | Value::Array(_) => None,
        }
    }

    /// The label this value contributes to counts and matrix keys.
    #[must_use]
    pub fn label(&self) -> StateLabel {
        match self {
            Self::Scalar(raw) | Self::Named(raw) => StateLabel::new(raw.as_str()),
        }
    }

    /// Normalize an optional raw value straight to a label.
    #[must_use]
    pub fn normalize(value: Option<&Value>) -> StateLabel {
        value
            .and_then(Self::from_json)
            .map_or_else(StateLabel::unset, |v| v.label())
    }
}

/// A normalized state name.
///
/// Empty input becomes [`UNSET_LABEL`] so that "no value" is a state of its
/// own rather than an empty string. Ordering is plain byte order, which is
/// the column order of the snapshot table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateLabel(String);

impl StateLabel {
    /// Build a label, mapping the empty string to the unset marker.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self::unset()
        } else {
            Self(raw)
        }
    }

    /// Build a label from an optional string (`fromString`/`toString`).
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map_or_else(Self::unset, Self::new)
    }

    /// The "no value" label.
    #[must_use]
    pub fn unset() -> Self {
        Self(UNSET_LABEL.to_string())
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.0 == UNSET_LABEL
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateLabel {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
