//! UTC timestamp parsing and formatting.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Parses an RFC 3339 / ISO 8601 timestamp string into a UTC timestamp.
///
/// Naive inputs (no timezone offset) are assumed to already be UTC. An
/// empty string returns `Ok(None)`. Anything else that fails to parse
/// returns `Error::InvalidTimestamp`.
pub fn parse_utc(value: &str) -> Result<Option<DateTime<Utc>>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Some(DateTime::from_naive_utc_and_offset(naive, Utc)));
    }
    if let Ok(naive) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let dt = naive
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time");
        return Ok(Some(DateTime::from_naive_utc_and_offset(dt, Utc)));
    }
    Err(Error::InvalidTimestamp(value.to_string()))
}

/// Formats a UTC timestamp as second-precision RFC 3339 with a `Z` suffix.
pub fn to_rfc3339_z(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
