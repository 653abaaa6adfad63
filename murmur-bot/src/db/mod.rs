//! Durable store access
//!
//! One module per aggregate: respondent profiles, the survey catalog
//! (read-only here; administered elsewhere), and sessions with their
//! responses.

use chrono::{DateTime, Utc};
use murmur_common::{Error, Result};

pub mod catalog;
pub mod respondents;
pub mod sessions;

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))
}
