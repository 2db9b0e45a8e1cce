//! Row-to-entity parsing helpers.
//!
//! Every store method needs to convert `libsql::Row` (column-indexed) into
//! typed entity structs. These helpers isolate the parsing logic and handle
//! the dual datetime format issue (`SQLite`'s `datetime('now')` vs Rust's
//! `to_rfc3339()`).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::StoreError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s
/// default format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `StoreError::Query` if the string cannot be parsed as either
/// format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all lintel-core enums that use
/// `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `StoreError::Query` if the string does not match any enum
/// variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| StoreError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty
/// string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `StoreError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, StoreError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a nullable TEXT column as a serde enum.
///
/// # Errors
///
/// Returns `StoreError::Query` if a non-empty value does not match any
/// variant.
pub fn get_opt_enum<T: serde::de::DeserializeOwned>(
    row: &libsql::Row,
    idx: i32,
) -> Result<Option<T>, StoreError> {
    get_opt_string(row, idx)?.map(|s| parse_enum(&s)).transpose()
}

/// Serialize a tag set to the JSON TEXT stored in the `system_tags` column.
#[must_use]
pub fn tags_to_json(tags: &BTreeSet<String>) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Parse the `system_tags` JSON TEXT column.
///
/// # Errors
///
/// Returns `StoreError::Query` on invalid JSON.
pub fn tags_from_json(s: &str) -> Result<BTreeSet<String>, StoreError> {
    serde_json::from_str(s)
        .map_err(|e| StoreError::Query(format!("Invalid tag set '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_datetime_both_formats() {
        assert!(parse_datetime("2026-02-09T14:30:00+00:00").is_ok());
        assert!(parse_datetime("2026-02-09 14:30:00").is_ok());
        assert!(parse_datetime("not a date").is_err());
    }

    #[test]
    fn tags_roundtrip() {
        let tags: BTreeSet<String> = ["convention", "pitfall"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let json = tags_to_json(&tags);
        assert_eq!(tags_from_json(&json).unwrap(), tags);
        assert!(tags_from_json("[]").unwrap().is_empty());
    }
}
