//! Assembled record types

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A relation waiting to be resolved to a record identifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationReference {
    #[serde(rename = "targetObjectName")]
    pub target_object: String,
    #[serde(rename = "matchFieldName")]
    pub match_field: String,
    pub match_value: Value,
    pub auto_create: bool,
}

impl RelationReference {
    /// Key identifying the lookup this reference performs
    pub fn cache_key(&self) -> String {
        let value = match &self.match_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{}:{}:{}", self.target_object, self.match_field, value)
    }
}

/// One field of an assembled record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Extracted (and transformed) source value
    Scalar(Value),
    /// Sub-field name to value
    Composite(BTreeMap<String, Value>),
    /// Unresolved relation
    Relation(RelationReference),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            FieldValue::Composite(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationReference> {
        match self {
            FieldValue::Relation(r) => Some(r),
            _ => None,
        }
    }
}

/// A CRM record built from one source item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl AssembledRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relation references still to be resolved
    pub fn relation_references(&self) -> impl Iterator<Item = (&str, &RelationReference)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_relation().map(|r| (k.as_str(), r)))
    }

    pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, FieldValue> {
        &mut self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }

    /// JSON rendering, relation references included as plain objects
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for AssembledRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// A record whose relations have all been replaced by identifiers
pub type ResolvedRecord = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference(value: Value) -> RelationReference {
        RelationReference {
            target_object: "company".to_string(),
            match_field: "domain".to_string(),
            match_value: value,
            auto_create: false,
        }
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(reference(json!("acme.com")).cache_key(), "company:domain:acme.com");
        assert_eq!(reference(json!(42)).cache_key(), "company:domain:42");
    }

    #[test]
    fn test_serializes_all_variants() {
        let mut record = AssembledRecord::new();
        record
            .fields_mut()
            .insert("email".to_string(), FieldValue::Scalar(json!("a@b.c")));
        record.fields_mut().insert(
            "name".to_string(),
            FieldValue::Composite(BTreeMap::from([("firstName".to_string(), json!("John"))])),
        );
        record
            .fields_mut()
            .insert("companyId".to_string(), FieldValue::Relation(reference(json!("acme.com"))));

        assert_eq!(
            record.to_json(),
            json!({
                "email": "a@b.c",
                "name": {"firstName": "John"},
                "companyId": {
                    "targetObjectName": "company",
                    "matchFieldName": "domain",
                    "matchValue": "acme.com",
                    "autoCreate": false
                }
            })
        );
        assert_eq!(record.relation_references().count(), 1);
    }
}
