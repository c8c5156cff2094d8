//! Field mapping engine
//!
//! Turns an arbitrary JSON payload into a normalized CRM record:
//!
//! - [`path`] - path expressions (`users[0].name`) over JSON values
//! - [`transform`] - per-field value transforms
//! - `field` - mapping configuration and its compiled form
//! - `assembler` - builds one record per source item
//!
//! Everything here is synchronous and side-effect free. Relation fields are
//! left as [`RelationReference`]s for the ingest layer to resolve.

mod assembler;
mod date;
mod error;
mod field;
pub mod path;
mod phone;
mod record;
pub mod transform;

pub use assembler::{Assembler, assemble};
pub(crate) use assembler::json_kind;
pub use error::{MappingError, PathError, RecordError};
pub use field::{FieldMapping, FieldMappingConfig, MappingMode, compile_mappings};
pub use path::{FieldPath, PathStep, extract};
pub use phone::{E164Normalizer, PhoneNormalizer};
pub use record::{AssembledRecord, FieldValue, RelationReference, ResolvedRecord};
pub use transform::{FieldTransform, TransformEngine, apply};
