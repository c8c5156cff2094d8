//! Batch ingestion
//!
//! Assembles each source record, resolves its relations and upserts it into
//! the pipeline's target object. Failures are recorded per record; the batch
//! always runs to the end.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::pipeline::{DedupKey, PipelineDefinition};
use super::report::{DEFAULT_SNIPPET_LEN, IngestionError};
use super::resolver::RelationResolver;
use super::store::RecordStore;
use crate::mapping::{Assembler, FieldMapping, ResolvedRecord};

/// Counts and errors for one processed batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub records_created: usize,
    pub records_updated: usize,
    /// Records that produced no fields
    pub records_skipped: usize,
    pub records_failed: usize,
    pub errors: Vec<IngestionError>,
}

impl ProcessingResult {
    pub fn total(&self) -> usize {
        self.records_created + self.records_updated + self.records_skipped + self.records_failed
    }
}

enum Outcome {
    Created,
    Updated,
    Skipped,
}

/// Processes record batches for one pipeline
pub struct RecordProcessor {
    pipeline_name: String,
    target_object: String,
    dedup: Option<DedupKey>,
    mappings: Vec<FieldMapping>,
    assembler: Assembler,
    store: Arc<dyn RecordStore>,
    snippet_len: usize,
}

impl RecordProcessor {
    /// Validate and compile `definition` for processing into `store`
    pub fn new(definition: &PipelineDefinition, store: Arc<dyn RecordStore>) -> Result<Self, PipelineError> {
        let mappings = definition.compile()?;
        Ok(Self {
            pipeline_name: definition.name.clone(),
            target_object: definition.target_object.clone(),
            dedup: definition.dedup_key(),
            mappings,
            assembler: Assembler::default(),
            store,
            snippet_len: DEFAULT_SNIPPET_LEN,
        })
    }

    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_snippet_len(mut self, snippet_len: usize) -> Self {
        self.snippet_len = snippet_len;
        self
    }

    /// Process a batch of source records
    pub async fn process(&self, records: &[Value]) -> ProcessingResult {
        debug!(pipeline = %self.pipeline_name, count = records.len(), "RecordProcessor::process: called");

        let mut result = ProcessingResult::default();
        let mut resolver = RelationResolver::new(self.store.clone());

        for (index, source) in records.iter().enumerate() {
            match self.process_one(source, &mut resolver).await {
                Ok(Outcome::Created) => result.records_created += 1,
                Ok(Outcome::Updated) => result.records_updated += 1,
                Ok(Outcome::Skipped) => result.records_skipped += 1,
                Err(message) => {
                    warn!(pipeline = %self.pipeline_name, index, %message, "Failed to process record");
                    result.records_failed += 1;
                    result
                        .errors
                        .push(IngestionError::new(index, source, message, self.snippet_len));
                }
            }
        }

        let stats = resolver.stats();
        info!(
            pipeline = %self.pipeline_name,
            created = result.records_created,
            updated = result.records_updated,
            skipped = result.records_skipped,
            failed = result.records_failed,
            relations_created = stats.created,
            relations_unresolved = stats.unresolved,
            "Ingestion batch complete"
        );
        result
    }

    async fn process_one(&self, source: &Value, resolver: &mut RelationResolver) -> Result<Outcome, String> {
        let assembled = self
            .assembler
            .assemble(source, &self.mappings)
            .map_err(|e| e.to_string())?;
        if assembled.is_empty() {
            return Ok(Outcome::Skipped);
        }

        let resolved = resolver.resolve(assembled).await;
        if resolved.is_empty() {
            return Ok(Outcome::Skipped);
        }

        if let Some(existing) = self.find_existing(&resolved).await? {
            self.store
                .update(&self.target_object, &existing, resolved)
                .await
                .map_err(|e| e.to_string())?;
            return Ok(Outcome::Updated);
        }

        self.store
            .create(&self.target_object, resolved)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Outcome::Created)
    }

    async fn find_existing(&self, record: &ResolvedRecord) -> Result<Option<String>, String> {
        let Some(key) = &self.dedup else {
            return Ok(None);
        };

        let value = match &key.sub_field {
            Some(sub) => record.get(&key.field).and_then(|v| v.get(sub)),
            None => record.get(&key.field),
        };
        let Some(value) = value else {
            return Ok(None);
        };

        self.store
            .find_by(&self.target_object, &key.field, key.sub_field.as_deref(), value)
            .await
            .map_err(|e| e.to_string())
    }
}
