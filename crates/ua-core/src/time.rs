//! Timestamp formatting and parsing.
//!
//! Timestamps are persisted as TEXT in RFC 3339 format (e.g.,
//! `2024-01-15T10:30:00.000Z`), always UTC. This keeps lexicographic
//! ordering in the database aligned with chronological ordering, so range
//! queries can compare the stored strings directly.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Failure to parse a stored timestamp back into a `DateTime<Utc>`.
#[derive(Debug, Error)]
#[error("invalid timestamp {timestamp:?}")]
pub struct TimestampParseError {
    pub timestamp: String,
    #[source]
    source: chrono::ParseError,
}

/// Formats a timestamp for database storage.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| TimestampParseError {
            timestamp: timestamp.to_string(),
            source,
        })
}
