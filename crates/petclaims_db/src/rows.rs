//! Conversions between stored text/integer columns and record fields.
//!
//! `sqlx::Any` cannot decode chrono types, so timestamps are stored as
//! fixed-width RFC 3339 text (which also sorts correctly as text), dates as
//! `YYYY-MM-DD` and booleans as integers.

use crate::error::DbError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};

/// Canonical stored form of a timestamp.
pub fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Canonical stored form of a date.
pub fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn flag(value: bool) -> i64 {
    i64::from(value)
}

pub fn string(row: &AnyRow, column: &str) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

/// `Any` over SQLite reports NULL as its own type, which `Option<T>` will not
/// decode; NULL has to be checked on the raw value first.
fn is_null(row: &AnyRow, column: &str) -> Result<bool, DbError> {
    row.try_get_raw(column)
        .map(|value| value.is_null())
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

pub fn opt_string(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    if is_null(row, column)? {
        return Ok(None);
    }
    string(row, column).map(Some)
}

pub fn boolean(row: &AnyRow, column: &str) -> Result<bool, DbError> {
    if is_null(row, column)? {
        return Ok(false);
    }
    row.try_get::<i64, _>(column)
        .map(|v| v != 0)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

pub fn opt_f64(row: &AnyRow, column: &str) -> Result<Option<f64>, DbError> {
    if is_null(row, column)? {
        return Ok(None);
    }
    row.try_get::<f64, _>(column)
        .map(Some)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

pub fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, DbError> {
    parse_ts(&string(row, column)?, column)
}

pub fn opt_timestamp(row: &AnyRow, column: &str) -> Result<Option<DateTime<Utc>>, DbError> {
    opt_string(row, column)?
        .filter(|s| !s.is_empty())
        .map(|s| parse_ts(&s, column))
        .transpose()
}

pub fn naive_date(row: &AnyRow, column: &str) -> Result<NaiveDate, DbError> {
    parse_date(&string(row, column)?, column)
}

pub fn opt_naive_date(row: &AnyRow, column: &str) -> Result<Option<NaiveDate>, DbError> {
    opt_string(row, column)?
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(&s, column))
        .transpose()
}

pub fn parse_ts(raw: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::DecodeError(format!("{} '{}': {}", column, raw, e)))
}

pub fn parse_date(raw: &str, column: &str) -> Result<NaiveDate, DbError> {
    // Some rows carry a full timestamp in date columns; the day part is what counts.
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DbError::DecodeError(format!("{} '{}': {}", column, raw, e)))
}

/// A fresh text primary key.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
