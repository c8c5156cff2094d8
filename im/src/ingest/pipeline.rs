//! Pipeline definitions
//!
//! A pipeline names the CRM object it writes, how incoming payloads are split
//! into records, and the field mappings applied to each record.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::PipelineError;
use crate::mapping::{FieldMapping, FieldMappingConfig, FieldPath, compile_mappings};

/// How records reach the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Records are posted to a webhook
    #[default]
    Push,
    /// Records are fetched from `sourceUrl` on a schedule
    Pull,
}

/// Credentials for a pull source
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceAuthConfig {
    Bearer {
        token: String,
    },
    #[serde(rename_all = "camelCase")]
    ApiKey {
        header_name: String,
        key: String,
    },
    #[serde(rename_all = "camelCase")]
    QueryParam {
        param_name: String,
        value: String,
    },
    Basic {
        username: String,
        password: String,
    },
}

// Secrets stay out of logs
impl std::fmt::Debug for SourceAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("key", &"***")
                .finish(),
            Self::QueryParam { param_name, .. } => f
                .debug_struct("QueryParam")
                .field("param_name", param_name)
                .field("value", &"***")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Pagination of a pull source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaginationConfig {
    #[serde(rename_all = "camelCase")]
    Offset {
        param_name: String,
        page_size: u32,
        #[serde(default)]
        max_pages: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Cursor {
        param_name: String,
        cursor_path: String,
        page_size: u32,
        #[serde(default)]
        max_pages: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Page {
        param_name: String,
        page_size: u32,
        #[serde(default)]
        max_pages: Option<u32>,
    },
}

impl PaginationConfig {
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Offset { page_size, .. } | Self::Cursor { page_size, .. } | Self::Page { page_size, .. } => {
                *page_size
            }
        }
    }

    pub fn max_pages(&self) -> Option<u32> {
        match self {
            Self::Offset { max_pages, .. } | Self::Cursor { max_pages, .. } | Self::Page { max_pages, .. } => {
                *max_pages
            }
        }
    }
}

/// A configured ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub mode: PipelineMode,

    /// Singular name of the CRM object records are written to
    #[serde(alias = "targetObjectNameSingular")]
    pub target_object: String,

    /// `field` or `field.subField` used to find an existing record to update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_field_name: Option<String>,

    /// Path to the record array inside a payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_records_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_auth: Option<SourceAuthConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationConfig>,

    /// Cron expression for pull pipelines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    #[serde(default)]
    pub mappings: Vec<FieldMappingConfig>,
}

impl PipelineDefinition {
    /// Parse a YAML (or JSON) definition
    pub fn from_yaml_str(content: &str) -> Result<Self, PipelineError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a definition from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).context(format!("Failed to read pipeline definition {}", path.display()))?;
        let definition = Self::from_yaml_str(&content)
            .context(format!("Failed to parse pipeline definition {}", path.display()))?;
        debug!(name = %definition.name, path = %path.display(), "PipelineDefinition::load: loaded");
        Ok(definition)
    }

    /// Check pipeline-level settings (mappings are checked by `compile`)
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.target_object.trim().is_empty() {
            return Err(PipelineError::invalid(&self.name, "target object is empty"));
        }

        if self.mappings.is_empty() {
            return Err(PipelineError::invalid(&self.name, "no field mappings configured"));
        }

        if self.mode == PipelineMode::Pull && self.source_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
            return Err(PipelineError::invalid(&self.name, "pull pipelines require a sourceUrl"));
        }

        if let Some(pagination) = &self.pagination
            && pagination.page_size() == 0
        {
            return Err(PipelineError::invalid(&self.name, "pagination pageSize must be positive"));
        }

        if let Some(path) = &self.response_records_path {
            FieldPath::parse(path).map_err(|e| {
                PipelineError::invalid(&self.name, format!("invalid responseRecordsPath '{}': {}", path, e))
            })?;
        }

        if let Some(dedup) = &self.dedup_field_name {
            DedupKey::parse(dedup).ok_or_else(|| {
                PipelineError::invalid(
                    &self.name,
                    format!("dedupFieldName '{}' must be 'field' or 'field.subField'", dedup),
                )
            })?;
        }

        Ok(())
    }

    /// Validate the pipeline and compile its mappings in position order
    pub fn compile(&self) -> Result<Vec<FieldMapping>, PipelineError> {
        self.validate()?;
        Ok(compile_mappings(&self.mappings)?)
    }

    /// Split a payload into source records for this pipeline
    pub fn records_from(&self, payload: &Value) -> Vec<Value> {
        extract_records(payload, self.response_records_path.as_deref())
    }

    pub(crate) fn dedup_key(&self) -> Option<DedupKey> {
        self.dedup_field_name.as_deref().and_then(DedupKey::parse)
    }
}

/// Target field (and optional composite sub-field) used for deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DedupKey {
    pub field: String,
    pub sub_field: Option<String>,
}

impl DedupKey {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let field = parts.next().filter(|f| !f.is_empty())?.to_string();
        let sub_field = match parts.next() {
            Some(sub) if !sub.is_empty() => Some(sub.to_string()),
            Some(_) => return None,
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { field, sub_field })
    }
}

/// Split a payload into records.
///
/// With `records_path`, the array found there (anything else yields no
/// records). Without it, an array payload yields its items and any other
/// payload is a batch of one.
pub fn extract_records(payload: &Value, records_path: Option<&str>) -> Vec<Value> {
    match records_path {
        Some(path) => match crate::mapping::extract(payload, path) {
            Some(Value::Array(items)) => items.clone(),
            _ => {
                debug!(path, "extract_records: no array at records path");
                Vec::new()
            }
        },
        None => match payload {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        },
    }
}
