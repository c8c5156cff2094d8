//! Relation resolution
//!
//! Replaces the relation references left by the assembler with record ids,
//! looking targets up (and optionally creating them) through a `RecordStore`.
//! Results are cached for the lifetime of the resolver, so one resolver per
//! ingestion run deduplicates lookups across the whole batch.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::RecordStore;
use crate::mapping::{AssembledRecord, FieldValue, RelationReference, ResolvedRecord};

/// Counters for one resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub found: usize,
    pub created: usize,
    /// References dropped because no target exists or the store failed
    pub unresolved: usize,
}

/// Run-scoped relation resolver
pub struct RelationResolver {
    store: Arc<dyn RecordStore>,
    cache: HashMap<String, String>,
    stats: ResolverStats,
}

impl RelationResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Resolve every relation in `record`.
    ///
    /// Unresolvable relations are dropped from the output rather than
    /// persisted as references.
    pub async fn resolve(&mut self, record: AssembledRecord) -> ResolvedRecord {
        let mut resolved = ResolvedRecord::new();

        for (field, value) in record.into_fields() {
            match value {
                FieldValue::Scalar(v) => {
                    resolved.insert(field, v);
                }
                FieldValue::Composite(parts) => {
                    resolved.insert(field, Value::Object(parts.into_iter().collect()));
                }
                FieldValue::Relation(reference) => match self.resolve_reference(&reference).await {
                    Some(id) => {
                        resolved.insert(field, Value::String(id));
                    }
                    None => {
                        debug!(%field, key = %reference.cache_key(), "RelationResolver::resolve: dropping unresolved relation");
                    }
                },
            }
        }

        resolved
    }

    /// Resolve a single reference to a record id
    pub async fn resolve_reference(&mut self, reference: &RelationReference) -> Option<String> {
        let key = reference.cache_key();
        if let Some(id) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return Some(id.clone());
        }

        let found = self
            .store
            .find_by(&reference.target_object, &reference.match_field, None, &reference.match_value)
            .await;

        let id = match found {
            Ok(Some(id)) => {
                self.stats.found += 1;
                id
            }
            Ok(None) if reference.auto_create => {
                let mut fields = ResolvedRecord::new();
                fields.insert(reference.match_field.clone(), reference.match_value.clone());
                match self.store.create(&reference.target_object, fields).await {
                    Ok(id) => {
                        self.stats.created += 1;
                        id
                    }
                    Err(e) => {
                        warn!(%key, error = %e, "Failed to create relation target");
                        self.stats.unresolved += 1;
                        return None;
                    }
                }
            }
            Ok(None) => {
                self.stats.unresolved += 1;
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to resolve relation");
                self.stats.unresolved += 1;
                return None;
            }
        };

        self.cache.insert(key, id.clone());
        Some(id)
    }
}
