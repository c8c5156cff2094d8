//! Ingestion layer
//!
//! Everything that sits around the mapping engine: pipeline definitions,
//! test runs, relation resolution against a record store, and batch
//! processing with per-record error collection.

mod error;
mod pipeline;
mod preview;
mod processor;
mod report;
mod resolver;
mod store;

pub use error::{PipelineError, StoreError};
pub use pipeline::{PaginationConfig, PipelineDefinition, PipelineMode, SourceAuthConfig, extract_records};
pub use preview::{DEFAULT_PREVIEW_LIMIT, PreviewOptions, PreviewResult, PreviewRunner, preview_pipeline, run_preview};
pub use processor::{ProcessingResult, RecordProcessor};
pub use report::{DEFAULT_SNIPPET_LEN, IngestionError, snippet};
pub use resolver::{RelationResolver, ResolverStats};
pub use store::{ID_FIELD, MemoryStore, RecordStore};
