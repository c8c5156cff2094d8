//! Ingest error types

use thiserror::Error;

use crate::mapping::MappingError;

/// Errors from a record store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown object: {object}")]
    UnknownObject { object: String },

    #[error("Record {id} not found in {object}")]
    RecordNotFound { object: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if the orchestrating job may retry the operation
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::UnknownObject { .. } => false,
            StoreError::RecordNotFound { .. } => false,
            StoreError::Backend(_) => false,
        }
    }
}

/// Pipeline setup failures; these abort a run before any record is touched
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid pipeline '{name}': {reason}")]
    Invalid { name: String, reason: String },

    #[error("Invalid field mappings: {0}")]
    Mapping(#[from] MappingError),

    #[error("Failed to parse pipeline definition: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl PipelineError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        PipelineError::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
