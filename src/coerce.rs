// 🔧 Coercion Layer - explicit fallible parses for loosely typed record fields
//
// Every "skip silently" decision in the transformer branches on one of these
// results. Nothing here panics on bad input.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("value is missing or null")]
    Missing,

    #[error("not an integer: {0}")]
    NotAnInteger(String),

    #[error("integer out of range: {0}")]
    OutOfRange(String),

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("not a date: {0}")]
    NotADate(String),

    #[error("unsupported {kind} value: {raw}")]
    UnsupportedType { kind: &'static str, raw: String },

    #[error("not a well-formed record: {0}")]
    NotARecord(String),
}

pub type CoerceResult<T> = std::result::Result<T, CoerceError>;

fn unsupported(kind: &'static str, value: &Value) -> CoerceError {
    CoerceError::UnsupportedType {
        kind,
        raw: value.to_string(),
    }
}

/// Unwrap an optional field, treating absence as a coercion failure
pub fn require(value: Option<&Value>) -> CoerceResult<&Value> {
    match value {
        Some(Value::Null) | None => Err(CoerceError::Missing),
        Some(v) => Ok(v),
    }
}

// ============================================================================
// INTEGERS
// ============================================================================

/// Coerce an int-like value
///
/// - integers as-is
/// - finite floats truncate toward zero (12.9 → 12)
/// - booleans → 1 / 0
/// - strings: trimmed, optional sign, `_` allowed between digits ("12.0" fails)
pub fn int_like(value: &Value) -> CoerceResult<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(CoerceError::OutOfRange(n.to_string()));
            }
            let f = n
                .as_f64()
                .ok_or_else(|| CoerceError::NotAnInteger(n.to_string()))?;
            float_to_int(f)
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => parse_int_str(s),
        Value::Null => Err(CoerceError::Missing),
        other => Err(unsupported("integer", other)),
    }
}

fn float_to_int(f: f64) -> CoerceResult<i64> {
    if !f.is_finite() {
        return Err(CoerceError::NotAnInteger(f.to_string()));
    }
    let truncated = f.trunc();
    // i64::MAX is not exactly representable; the upper bound is exclusive
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(CoerceError::OutOfRange(f.to_string()));
    }
    Ok(truncated as i64)
}

/// Parse a base-10 integer string
pub fn parse_int_str(raw: &str) -> CoerceResult<i64> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    let well_formed = !digits.is_empty()
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__")
        && digits.chars().all(|c| c.is_ascii_digit() || c == '_');

    if !well_formed {
        return Err(CoerceError::NotAnInteger(raw.to_string()));
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<i64>()
        .map_err(|_| CoerceError::OutOfRange(raw.to_string()))
}

// ============================================================================
// PRICES
// ============================================================================

/// Parse a price: strip every `$` and `,`, then read a float
///
/// Numbers go through their JSON text form so `10` and `"10"` agree.
pub fn price(value: &Value) -> CoerceResult<f64> {
    match value {
        Value::String(s) => parse_price_str(s),
        Value::Number(n) => parse_price_str(&n.to_string()),
        Value::Null => Err(CoerceError::Missing),
        other => Err(unsupported("price", other)),
    }
}

/// "$1,234.50" → 1234.5, "42" → 42.0
pub fn parse_price_str(raw: &str) -> CoerceResult<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(CoerceError::NotANumber(raw.to_string()));
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| CoerceError::NotANumber(raw.to_string()))
}

// ============================================================================
// DATES
// ============================================================================

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Parse a date-like string into a naive timestamp
///
/// Offsets are normalized to UTC and dropped. A bare date is midnight.
pub fn timestamp(value: &Value) -> CoerceResult<NaiveDateTime> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Null => Err(CoerceError::Missing),
        other => Err(unsupported("date", other)),
    }
}

pub fn parse_timestamp_str(raw: &str) -> CoerceResult<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(CoerceError::NotADate(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(chrono::NaiveTime::MIN));
        }
    }

    // YYYYMMDD
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse::<i32>().ok();
        let month = s[4..6].parse::<u32>().ok();
        let day = s[6..8].parse::<u32>().ok();
        if let (Some(y), Some(m), Some(d)) = (year, month, day) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Ok(date.and_time(chrono::NaiveTime::MIN));
            }
        }
    }

    Err(CoerceError::NotADate(raw.to_string()))
}

// ============================================================================
// TEXT
// ============================================================================

/// Render any non-null value as text (strings pass through untouched)
pub fn text(value: &Value) -> CoerceResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Null => Err(CoerceError::Missing),
        other => Ok(other.to_string()),
    }
}
