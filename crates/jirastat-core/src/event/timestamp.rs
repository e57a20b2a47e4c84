//! Timestamp parsing for issue exports.
//!
//! JIRA writes `2024-01-03T10:00:00.000+0000`, which is not RFC 3339 (the
//! offset lacks a colon). Parsing tries, in order:
//!
//! 1. RFC 3339 (`2024-01-03T10:00:00Z`, `2024-01-03T10:00:00+09:00`)
//! 2. the fixed JIRA pattern with a colon-less offset
//! 3. naive date-time, taken as UTC
//! 4. bare date, taken as midnight UTC
//!
//! The offset of the source string is preserved: calendar dates derived from
//! an instant are the dates as written in the export.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// A point in time with the offset it was recorded in.
pub type Instant = DateTime<FixedOffset>;

const OFFSET_PATTERNS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_PATTERNS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp matched none of the accepted formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable timestamp '{raw}'")]
pub struct TimestampError {
    /// The rejected input.
    pub raw: String,
}

/// Parse an export timestamp.
///
/// # Errors
///
/// Returns [`TimestampError`] when every accepted format fails.
pub fn parse_timestamp(raw: &str) -> Result<Instant, TimestampError> {
    let trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }

    for pattern in OFFSET_PATTERNS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, pattern) {
            return Ok(ts);
        }
    }

    for pattern in NAIVE_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }

    Err(TimestampError {
        raw: raw.to_string(),
    })
}

/// Midnight UTC at the start of `date`.
#[must_use]
pub fn midnight_utc(date: NaiveDate) -> Instant {
    date.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}
