//! Record assembly
//!
//! Builds one `AssembledRecord` per source item. Assembly is synchronous and
//! holds no state across items, so callers may assemble items concurrently.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::error::RecordError;
use super::field::{FieldMapping, MappingMode};
use super::record::{AssembledRecord, FieldValue, RelationReference};
use super::transform::TransformEngine;

/// Assembles records using a transform engine
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    engine: TransformEngine,
}

impl Assembler {
    pub fn new(engine: TransformEngine) -> Self {
        Self { engine }
    }

    /// Build a record from `source` using compiled `mappings`.
    ///
    /// Mappings are evaluated in slice order, which `compile_mappings` sets to
    /// ascending position. Missing or empty values skip their mapping.
    pub fn assemble(&self, source: &Value, mappings: &[FieldMapping]) -> Result<AssembledRecord, RecordError> {
        if !source.is_object() {
            return Err(RecordError::NotAnObject {
                kind: json_kind(source),
            });
        }

        let mut record = AssembledRecord::new();
        let fields = record.fields_mut();

        for mapping in mappings {
            let Some(raw) = mapping.source_path.resolve(source).filter(|v| !is_blank(v)) else {
                continue;
            };

            let Some(value) = self
                .engine
                .apply(raw, mapping.transform.as_ref())
                .filter(|v| !is_blank(v))
            else {
                continue;
            };

            match &mapping.mode {
                MappingMode::Direct => {
                    fields.insert(mapping.target_field.clone(), FieldValue::Scalar(value));
                }
                MappingMode::Relation {
                    target_object,
                    match_field,
                    auto_create,
                } => {
                    let reference = RelationReference {
                        target_object: target_object.clone(),
                        match_field: match_field.clone(),
                        match_value: value,
                        auto_create: *auto_create,
                    };
                    fields.insert(mapping.target_field.clone(), FieldValue::Relation(reference));
                }
                MappingMode::Composite { sub_field } => {
                    let entry = fields
                        .entry(mapping.target_field.clone())
                        .or_insert_with(|| FieldValue::Composite(BTreeMap::new()));
                    match entry {
                        FieldValue::Composite(parts) => {
                            parts.insert(sub_field.clone(), value);
                        }
                        _ => {
                            warn!(
                                target_field = %mapping.target_field,
                                sub_field = %sub_field,
                                "Assembler::assemble: target already holds a non-composite value, skipping"
                            );
                        }
                    }
                }
            }
        }

        debug!(field_count = record.len(), "Assembler::assemble: done");
        Ok(record)
    }
}

/// Assemble with the default transform engine
pub fn assemble(source: &Value, mappings: &[FieldMapping]) -> Result<AssembledRecord, RecordError> {
    Assembler::default().assemble(source, mappings)
}

/// Null and the empty string count as "no value"
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
