//! Pipeline test runs
//!
//! Assembles sample records without persisting anything or resolving
//! relations, so pipeline authors can see what a payload will turn into.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::PipelineError;
use super::pipeline::PipelineDefinition;
use super::report::{DEFAULT_SNIPPET_LEN, IngestionError};
use crate::mapping::{AssembledRecord, Assembler, FieldMapping};

/// Default number of assembled records returned in a preview
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Preview settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Maximum records kept in `preview_records`
    pub limit: usize,
    /// Maximum length of source snippets in errors
    pub snippet_len: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PREVIEW_LIMIT,
            snippet_len: DEFAULT_SNIPPET_LEN,
        }
    }
}

/// Outcome of a test run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    /// No record failed
    pub success: bool,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub preview_records: Vec<AssembledRecord>,
    pub errors: Vec<IngestionError>,
}

/// Runs the assembler over sample records
#[derive(Debug, Clone, Default)]
pub struct PreviewRunner {
    assembler: Assembler,
    options: PreviewOptions,
}

impl PreviewRunner {
    pub fn new(assembler: Assembler, options: PreviewOptions) -> Self {
        Self { assembler, options }
    }

    /// Assemble every sample with already compiled mappings
    pub fn run(&self, samples: &[Value], mappings: &[FieldMapping]) -> PreviewResult {
        debug!(samples = samples.len(), mappings = mappings.len(), "PreviewRunner::run: called");

        let mut preview_records = Vec::new();
        let mut errors = Vec::new();
        let mut valid_records = 0;

        for (index, sample) in samples.iter().enumerate() {
            match self.assembler.assemble(sample, mappings) {
                Ok(record) => {
                    valid_records += 1;
                    if preview_records.len() < self.options.limit {
                        preview_records.push(record);
                    }
                }
                Err(e) => {
                    errors.push(IngestionError::new(index, sample, e.to_string(), self.options.snippet_len));
                }
            }
        }

        let invalid_records = errors.len();
        info!(
            total = samples.len(),
            valid = valid_records,
            invalid = invalid_records,
            "Preview complete"
        );

        PreviewResult {
            success: invalid_records == 0,
            total_records: samples.len(),
            valid_records,
            invalid_records,
            preview_records,
            errors,
        }
    }

    /// Validate and compile `definition`, then preview `samples`.
    ///
    /// Configuration errors abort before any sample is assembled.
    pub fn run_pipeline(&self, definition: &PipelineDefinition, samples: &[Value]) -> Result<PreviewResult, PipelineError> {
        let mappings = definition.compile()?;
        Ok(self.run(samples, &mappings))
    }
}

/// Preview with default options and transform engine, keeping at most `limit` records
pub fn run_preview(samples: &[Value], mappings: &[FieldMapping], limit: usize) -> PreviewResult {
    let options = PreviewOptions {
        limit,
        ..Default::default()
    };
    PreviewRunner::new(Assembler::default(), options).run(samples, mappings)
}

/// Compile `definition` and preview `samples`, keeping at most `limit` records
pub fn preview_pipeline(
    definition: &PipelineDefinition,
    samples: &[Value],
    limit: usize,
) -> Result<PreviewResult, PipelineError> {
    let options = PreviewOptions {
        limit,
        ..Default::default()
    };
    PreviewRunner::new(Assembler::default(), options).run_pipeline(definition, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldMappingConfig, compile_mappings};
    use serde_json::json;

    fn mappings() -> Vec<FieldMapping> {
        compile_mappings(&[
            FieldMappingConfig::new("email", "email"),
            FieldMappingConfig::new("company", "companyId").with_relation("company", "domain", false),
        ])
        .unwrap()
    }

    #[test]
    fn test_missing_fields_are_not_failures() {
        let samples = vec![json!({"email": "a@b.c"}), json!({}), json!({"other": 1})];
        let result = run_preview(&samples, &mappings(), 10);

        assert!(result.success);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.valid_records, 3);
        assert_eq!(result.invalid_records, 0);
        assert_eq!(result.preview_records.len(), 3);
        assert!(result.preview_records[1].is_empty());
    }

    #[test]
    fn test_structural_failures_are_reported() {
        let samples = vec![json!({"email": "a@b.c"}), json!("not a record"), json!(null)];
        let result = run_preview(&samples, &mappings(), 10);

        assert!(!result.success);
        assert_eq!(result.valid_records, 1);
        assert_eq!(result.invalid_records, 2);
        assert_eq!(result.errors[0].record_index, 1);
        assert_eq!(result.errors[1].record_index, 2);
        assert!(result.errors[0].message.contains("string"));
        assert_eq!(result.errors[0].source_snippet.as_deref(), Some("\"not a record\""));
    }

    #[test]
    fn test_preview_is_bounded() {
        let samples: Vec<Value> = (0..25).map(|i| json!({"email": format!("u{}@x.io", i)})).collect();
        let result = run_preview(&samples, &mappings(), 5);

        assert_eq!(result.total_records, 25);
        assert_eq!(result.valid_records, 25);
        assert_eq!(result.preview_records.len(), 5);
    }

    #[test]
    fn test_relations_are_left_unresolved() {
        let result = run_preview(&[json!({"company": "acme.com"})], &mappings(), 10);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["previewRecords"][0]["companyId"]["matchValue"], json!("acme.com"));
        assert_eq!(json["totalRecords"], json!(1));
    }

    #[test]
    fn test_run_pipeline_rejects_bad_config() {
        let definition = PipelineDefinition::from_yaml_str(
            "name: broken\ntargetObject: person\nmappings:\n  - sourceFieldPath: a\n    targetFieldName: company\n    relationTargetObjectName: company\n",
        )
        .unwrap();

        let result = PreviewRunner::default().run_pipeline(&definition, &[json!({"a": 1})]);
        assert!(matches!(result, Err(PipelineError::Mapping(_))));
    }

    #[test]
    fn test_preview_pipeline_applies_limit() {
        let definition = PipelineDefinition::from_yaml_str(
            "name: ok\ntargetObject: person\nmappings:\n  - sourceFieldPath: a\n    targetFieldName: city\n",
        )
        .unwrap();
        let samples = vec![json!({"a": "x"}), json!({"a": "y"})];

        let result = preview_pipeline(&definition, &samples, 1).unwrap();
        assert_eq!(result.valid_records, 2);
        assert_eq!(result.preview_records.len(), 1);
        assert_eq!(result.preview_records[0].to_json(), json!({"city": "x"}));
    }
}
