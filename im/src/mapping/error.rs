//! Mapping error types

use thiserror::Error;

/// Errors raised while parsing a path expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Empty segment at position {position} in path '{path}'")]
    EmptySegment { path: String, position: usize },

    #[error("Malformed segment '{segment}' in path '{path}'")]
    MalformedSegment { path: String, segment: String },

    #[error("Index '{index}' out of range in path '{path}'")]
    IndexOutOfRange { path: String, index: String },
}

/// Configuration failures detected when compiling field mappings.
///
/// Any of these aborts the run before a single record is processed.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Mapping at position {position} has an empty target field name")]
    EmptyTargetField { position: i32 },

    #[error("Mapping for '{target_field}' has an invalid source path: {source}")]
    InvalidSourcePath {
        target_field: String,
        #[source]
        source: PathError,
    },

    #[error("Mapping for '{target_field}' sets {present} but not {missing}")]
    PartialRelation {
        target_field: String,
        present: &'static str,
        missing: &'static str,
    },

    #[error("Mapping for '{target_field}' sets both a composite sub-field and relation fields")]
    AmbiguousMode { target_field: String },

    #[error("Target field '{target_field}' is used as both a composite and a non-composite target")]
    ModeConflict { target_field: String },
}

impl MappingError {
    /// Target field the failing mapping writes to, if any
    pub fn target_field(&self) -> Option<&str> {
        match self {
            MappingError::EmptyTargetField { .. } => None,
            MappingError::InvalidSourcePath { target_field, .. }
            | MappingError::PartialRelation { target_field, .. }
            | MappingError::AmbiguousMode { target_field }
            | MappingError::ModeConflict { target_field } => Some(target_field),
        }
    }
}

/// Record-level failures: the source item itself is unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Source record must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}
