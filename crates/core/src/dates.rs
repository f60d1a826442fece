//! Flexible parsing for extractor-supplied date strings.
//!
//! Upstream detectors hand over dates in whatever shape the source text
//! used, so the reconciler accepts several common formats rather than a
//! single canonical one. Date-only inputs resolve to midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

/// The input did not match any supported date shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised date string: {input:?}")]
pub struct DateParseError {
    pub input: String,
}

const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"];

/// Parses a date string into a UTC instant, trying RFC 3339 first, then a
/// naive datetime, then date-only layouts.
pub fn parse_flexible(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.to_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    for format in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    Err(DateParseError {
        input: trimmed.to_string(),
    })
}
