//! Date parsing for the `dateFormat` transform

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::transform::coerce_string;

/// Naive datetime layouts tried in auto mode, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse `value` according to `source_format` and render it as ISO-8601 UTC.
///
/// Recognized formats: `unix`, `unix_ms`, `iso`/`auto`, or a chrono
/// strftime pattern. Unknown format names fall back to auto detection.
pub fn to_iso8601(value: &Value, source_format: &str) -> Option<String> {
    let parsed = match source_format {
        "unix" => from_epoch(value, 1000.0),
        "unix_ms" => from_epoch(value, 1.0),
        pattern if pattern.contains('%') => parse_with_pattern(&coerce_string(value)?, pattern),
        _ => match value {
            Value::Number(_) => from_epoch(value, 1.0),
            Value::String(s) => parse_auto(s),
            _ => None,
        },
    }?;

    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn from_epoch(value: &Value, millis_per_unit: f64) -> Option<DateTime<Utc>> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let millis = amount * millis_per_unit;
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

fn parse_auto(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_with_pattern(text: &str, pattern: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(text, pattern)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
