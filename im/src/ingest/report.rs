//! Per-record error reporting

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default length of the source snippet kept with an error
pub const DEFAULT_SNIPPET_LEN: usize = 200;

/// One failed source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionError {
    /// Index of the record in its batch
    pub record_index: usize,

    /// Offending field, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    /// Compact JSON of the source record, truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,

    pub message: String,
}

impl IngestionError {
    /// Error for the record at `record_index`, capturing a snippet of its source
    pub fn new(record_index: usize, source: &Value, message: impl Into<String>, snippet_len: usize) -> Self {
        Self {
            record_index,
            field_name: None,
            source_snippet: Some(snippet(source, snippet_len)),
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }
}

/// Compact JSON text of `value`, cut to at most `max_len` characters
pub fn snippet(value: &Value, max_len: usize) -> String {
    let text = value.to_string();
    if text.chars().count() <= max_len {
        return text;
    }
    let mut cut: String = text.chars().take(max_len).collect();
    cut.push_str("...");
    cut
}
