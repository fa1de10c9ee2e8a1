//! `YYYY-MM-DD HH:MM:SS` date-time text, interpreted as UTC

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serializer;

/// Exchange format for date-times on every outer surface
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a wire date-time
pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), WIRE_FORMAT).map(|naive| naive.and_utc())
}

/// Render a date-time in wire format
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Serde helper for `#[serde(serialize_with = ...)]`
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}
