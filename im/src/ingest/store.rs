//! Record store boundary
//!
//! Persistence lives outside this crate. The ingest layer talks to it through
//! [`RecordStore`]; [`MemoryStore`] backs dry runs and tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::StoreError;
use crate::mapping::ResolvedRecord;

/// Field holding a stored record's identifier
pub const ID_FIELD: &str = "id";

/// Lookup/create/update access to CRM records, keyed by object name
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the id of a record of `object` whose `field` (or `field.sub_field`) equals `value`
    async fn find_by(
        &self,
        object: &str,
        field: &str,
        sub_field: Option<&str>,
        value: &Value,
    ) -> Result<Option<String>, StoreError>;

    /// Create a record and return its id
    async fn create(&self, object: &str, fields: ResolvedRecord) -> Result<String, StoreError>;

    /// Merge `fields` into an existing record
    async fn update(&self, object: &str, id: &str, fields: ResolvedRecord) -> Result<(), StoreError>;
}

/// In-process record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// When set, only these objects exist
    allowed: Option<BTreeSet<String>>,
    /// object -> id -> record
    objects: RwLock<BTreeMap<String, BTreeMap<String, ResolvedRecord>>>,
}

impl MemoryStore {
    /// Store that accepts any object name
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that only knows the given objects
    pub fn with_objects<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(objects.into_iter().map(Into::into).collect()),
            objects: RwLock::default(),
        }
    }

    fn check_object(&self, object: &str) -> Result<(), StoreError> {
        match &self.allowed {
            Some(allowed) if !allowed.contains(object) => Err(StoreError::UnknownObject {
                object: object.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Snapshot of all records of `object`, in id order
    pub async fn records(&self, object: &str) -> Vec<ResolvedRecord> {
        let objects = self.objects.read().await;
        objects
            .get(object)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn count(&self, object: &str) -> usize {
        self.objects.read().await.get(object).map_or(0, BTreeMap::len)
    }

    /// Snapshot of every object's records
    pub async fn dump(&self) -> BTreeMap<String, Vec<ResolvedRecord>> {
        let objects = self.objects.read().await;
        objects
            .iter()
            .map(|(name, records)| (name.clone(), records.values().cloned().collect()))
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by(
        &self,
        object: &str,
        field: &str,
        sub_field: Option<&str>,
        value: &Value,
    ) -> Result<Option<String>, StoreError> {
        self.check_object(object)?;
        let objects = self.objects.read().await;
        let Some(records) = objects.get(object) else {
            return Ok(None);
        };

        let found = records.iter().find_map(|(id, record)| {
            let candidate = match sub_field {
                Some(sub) => record.get(field).and_then(|v| v.get(sub)),
                None => record.get(field),
            };
            (candidate == Some(value)).then(|| id.clone())
        });

        debug!(object, field, ?sub_field, found = found.is_some(), "MemoryStore::find_by: done");
        Ok(found)
    }

    async fn create(&self, object: &str, mut fields: ResolvedRecord) -> Result<String, StoreError> {
        self.check_object(object)?;
        let id = Uuid::now_v7().to_string();
        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut objects = self.objects.write().await;
        objects.entry(object.to_string()).or_default().insert(id.clone(), fields);
        debug!(object, %id, "MemoryStore::create: created");
        Ok(id)
    }

    async fn update(&self, object: &str, id: &str, fields: ResolvedRecord) -> Result<(), StoreError> {
        self.check_object(object)?;
        let mut objects = self.objects.write().await;
        let record = objects
            .get_mut(object)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::RecordNotFound {
                object: object.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            if key != ID_FIELD {
                record.insert(key, value);
            }
        }
        debug!(object, id, "MemoryStore::update: updated");
        Ok(())
    }
}
