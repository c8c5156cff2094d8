//! ingestmap - field mapping engine for CRM ingestion pipelines
//!
//! Maps arbitrary JSON payloads (webhook bodies, API responses) onto CRM
//! records. Each pipeline declares a list of field mappings; every source
//! record is assembled into a normalized record and then upserted into the
//! pipeline's target object.
//!
//! # Architecture
//!
//! ```text
//! payload ──► extract_records ──► Assembler ──► RelationResolver ──► RecordStore
//!                                    │                 │
//!                          FieldPath + TransformEngine  └─ find / auto-create
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ingestmap::{FieldMappingConfig, FieldTransform, assemble, compile_mappings};
//!
//! let mappings = compile_mappings(&[
//!     FieldMappingConfig::new("contact.email", "emails")
//!         .with_sub_field("primaryEmail")
//!         .with_transform(FieldTransform::Lowercase),
//! ])?;
//! let record = assemble(&payload, &mappings)?;
//! ```

pub mod cli;
pub mod config;
pub mod ingest;
pub mod mapping;

pub use config::Config;
pub use ingest::{
    MemoryStore, PipelineDefinition, PipelineError, PreviewResult, PreviewRunner, ProcessingResult, RecordProcessor,
    RecordStore, StoreError, preview_pipeline, run_preview,
};
pub use mapping::{
    AssembledRecord, Assembler, FieldMapping, FieldMappingConfig, FieldPath, FieldTransform, FieldValue,
    MappingError, RelationReference, TransformEngine, assemble, compile_mappings, extract,
};
