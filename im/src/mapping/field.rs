//! Field mapping configuration and compilation
//!
//! Stored mapping entries carry their mode implicitly through which optional
//! fields are set. `compile_mappings` turns them into `FieldMapping`s with an
//! explicit `MappingMode`, rejecting ambiguous or conflicting entries up front.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::error::MappingError;
use super::path::FieldPath;
use super::transform::FieldTransform;

/// A field mapping entry as stored in pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingConfig {
    /// Path expression into the source payload
    pub source_field_path: String,

    /// CRM field written by this mapping
    pub target_field_name: String,

    /// Sub-key of a composite target field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_composite_sub_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<FieldTransform>,

    /// Object looked up for relation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_target_object_name: Option<String>,

    /// Field on the related object matched against the source value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_match_field_name: Option<String>,

    /// Create the related record when no match exists
    #[serde(default)]
    pub relation_auto_create: bool,

    /// Evaluation order
    #[serde(default)]
    pub position: i32,
}

impl FieldMappingConfig {
    /// Direct mapping from `source` to `target`
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_field_path: source.into(),
            target_field_name: target.into(),
            ..Default::default()
        }
    }

    pub fn with_sub_field(mut self, sub_field: impl Into<String>) -> Self {
        self.target_composite_sub_field = Some(sub_field.into());
        self
    }

    pub fn with_relation(mut self, object: impl Into<String>, match_field: impl Into<String>, auto_create: bool) -> Self {
        self.relation_target_object_name = Some(object.into());
        self.relation_match_field_name = Some(match_field.into());
        self.relation_auto_create = auto_create;
        self
    }

    pub fn with_transform(mut self, transform: FieldTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }
}

/// How a mapping writes into the assembled record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingMode {
    /// `record[target] = value`
    Direct,
    /// `record[target][sub_field] = value`
    Composite { sub_field: String },
    /// `record[target] = reference to a record of another object`
    Relation {
        target_object: String,
        match_field: String,
        auto_create: bool,
    },
}

impl MappingMode {
    pub fn is_composite(&self) -> bool {
        matches!(self, MappingMode::Composite { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            MappingMode::Direct => "direct",
            MappingMode::Composite { .. } => "composite",
            MappingMode::Relation { .. } => "relation",
        }
    }
}

/// A validated field mapping
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub source_path: FieldPath,
    pub target_field: String,
    pub mode: MappingMode,
    pub transform: Option<FieldTransform>,
    pub position: i32,
}

impl FieldMapping {
    /// Validate a single configuration entry
    pub fn from_config(config: &FieldMappingConfig) -> Result<Self, MappingError> {
        let target_field = config.target_field_name.trim();
        if target_field.is_empty() {
            return Err(MappingError::EmptyTargetField {
                position: config.position,
            });
        }

        let source_path =
            FieldPath::parse(&config.source_field_path).map_err(|source| MappingError::InvalidSourcePath {
                target_field: target_field.to_string(),
                source,
            })?;

        let relation = match (
            non_empty(&config.relation_target_object_name),
            non_empty(&config.relation_match_field_name),
        ) {
            (Some(object), Some(field)) => Some((object, field)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(MappingError::PartialRelation {
                    target_field: target_field.to_string(),
                    present: "relationTargetObjectName",
                    missing: "relationMatchFieldName",
                });
            }
            (None, Some(_)) => {
                return Err(MappingError::PartialRelation {
                    target_field: target_field.to_string(),
                    present: "relationMatchFieldName",
                    missing: "relationTargetObjectName",
                });
            }
        };

        let mode = match (non_empty(&config.target_composite_sub_field), relation) {
            (Some(_), Some(_)) => {
                return Err(MappingError::AmbiguousMode {
                    target_field: target_field.to_string(),
                });
            }
            (Some(sub_field), None) => MappingMode::Composite {
                sub_field: sub_field.to_string(),
            },
            (None, Some((object, field))) => MappingMode::Relation {
                target_object: object.to_string(),
                match_field: field.to_string(),
                auto_create: config.relation_auto_create,
            },
            (None, None) => MappingMode::Direct,
        };

        Ok(Self {
            source_path,
            target_field: target_field.to_string(),
            mode,
            transform: config.transform.clone(),
            position: config.position,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validate and order mapping entries by ascending position.
///
/// Entries sharing a position keep their configured order.
pub fn compile_mappings(configs: &[FieldMappingConfig]) -> Result<Vec<FieldMapping>, MappingError> {
    debug!(count = configs.len(), "compile_mappings: called");

    let mut mappings = configs
        .iter()
        .map(FieldMapping::from_config)
        .collect::<Result<Vec<_>, _>>()?;
    mappings.sort_by_key(|m| m.position);

    // target field -> whether it is written as a composite
    let mut target_kinds: HashMap<&str, bool> = HashMap::new();
    for mapping in &mappings {
        let is_composite = mapping.mode.is_composite();
        match target_kinds.get(mapping.target_field.as_str()) {
            Some(&seen) if seen != is_composite => {
                return Err(MappingError::ModeConflict {
                    target_field: mapping.target_field.clone(),
                });
            }
            Some(_) => {}
            None => {
                target_kinds.insert(&mapping.target_field, is_composite);
            }
        }
    }

    Ok(mappings)
}
