//! Per-field value transforms
//!
//! Every transform is total: input it cannot represent resolves to `None`
//! (the field is skipped) instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::date::to_iso8601;
use super::phone::{E164Normalizer, PhoneNormalizer};

/// Literal values treated as "no data" by `sanitizeNull`
const NULL_SENTINELS: &[&str] = &["", "null", "NULL", "None", "none", "undefined", "N/A", "n/a"];

/// A declared field transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldTransform {
    /// Canonical international phone format
    PhoneNormalize,
    /// Substitute values through a lookup table; unmatched values pass through
    Map { values: BTreeMap<String, String> },
    Uppercase,
    Lowercase,
    Trim,
    /// Parse with `source_format` and emit ISO-8601
    #[serde(rename_all = "camelCase")]
    DateFormat { source_format: String },
    /// Multiply a numeric value and round to the nearest integer
    NumberScale { multiplier: f64 },
    /// Map empty sentinels to no value
    SanitizeNull,
    /// Replace any present value with a constant
    Static { value: Value },
}

impl FieldTransform {
    /// Tag name as it appears in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            FieldTransform::PhoneNormalize => "phoneNormalize",
            FieldTransform::Map { .. } => "map",
            FieldTransform::Uppercase => "uppercase",
            FieldTransform::Lowercase => "lowercase",
            FieldTransform::Trim => "trim",
            FieldTransform::DateFormat { .. } => "dateFormat",
            FieldTransform::NumberScale { .. } => "numberScale",
            FieldTransform::SanitizeNull => "sanitizeNull",
            FieldTransform::Static { .. } => "static",
        }
    }
}

/// Applies transforms with a configurable phone normalizer
#[derive(Debug, Clone)]
pub struct TransformEngine {
    phone: Arc<dyn PhoneNormalizer>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(Arc::new(E164Normalizer::default()))
    }
}

impl TransformEngine {
    pub fn new(phone: Arc<dyn PhoneNormalizer>) -> Self {
        Self { phone }
    }

    /// Transform `raw`; `None` means the value is unrepresentable
    pub fn apply(&self, raw: &Value, transform: Option<&FieldTransform>) -> Option<Value> {
        let Some(transform) = transform else {
            return Some(raw.clone());
        };

        let result = match transform {
            FieldTransform::PhoneNormalize => coerce_string(raw)
                .and_then(|s| self.phone.normalize(&s))
                .map(Value::String),
            FieldTransform::Map { values } => match coerce_string(raw) {
                Some(key) => Some(values.get(&key).map_or_else(|| raw.clone(), |v| Value::String(v.clone()))),
                None => Some(raw.clone()),
            },
            FieldTransform::Uppercase => Some(map_string(raw, |s| s.to_uppercase())),
            FieldTransform::Lowercase => Some(map_string(raw, |s| s.to_lowercase())),
            FieldTransform::Trim => Some(map_string(raw, |s| s.trim().to_string())),
            FieldTransform::DateFormat { source_format } => to_iso8601(raw, source_format).map(Value::String),
            FieldTransform::NumberScale { multiplier } => scale_number(raw, *multiplier),
            FieldTransform::SanitizeNull => sanitize_null(raw),
            FieldTransform::Static { value } => Some(value.clone()),
        };

        if result.is_none() {
            debug!(transform = transform.kind(), "TransformEngine::apply: value dropped");
        }
        result
    }
}

/// Apply `transform` with the default engine
pub fn apply(raw: &Value, transform: Option<&FieldTransform>) -> Option<Value> {
    TransformEngine::default().apply(raw, transform)
}

/// String form of a scalar; `None` for null, arrays and objects
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn map_string(raw: &Value, f: impl FnOnce(&str) -> String) -> Value {
    match coerce_string(raw) {
        Some(s) => Value::String(f(&s)),
        None => raw.clone(),
    }
}

fn scale_number(raw: &Value, multiplier: f64) -> Option<Value> {
    let number = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let scaled = (number * multiplier).round();
    if !scaled.is_finite() {
        return None;
    }
    if scaled.abs() < i64::MAX as f64 {
        Some(Value::from(scaled as i64))
    } else {
        serde_json::Number::from_f64(scaled).map(Value::Number)
    }
}

fn sanitize_null(raw: &Value) -> Option<Value> {
    match raw {
        Value::Null => None,
        Value::String(s) if NULL_SENTINELS.contains(&s.as_str()) => None,
        _ => Some(raw.clone()),
    }
}
