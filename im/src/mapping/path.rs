//! Path expressions over JSON payloads
//!
//! Grammar: `segment ("." segment)*` where a segment is an identifier,
//! optionally followed by a bracketed non-negative index: `users[0].name`.
//! There is no escaping; identifiers cannot contain `.`, `[` or `]`.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use super::error::PathError;

static INDEXED_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\[\]]+)\[(\d+)\]$").expect("indexed segment regex is valid"));

/// One traversal step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Object key lookup
    Key(String),
    /// Array index lookup
    Index(usize),
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    steps: Vec<PathStep>,
}

impl FieldPath {
    /// Parse a path expression
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let mut steps = Vec::new();
        for (position, segment) in path.split('.').enumerate() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    path: path.to_string(),
                    position,
                });
            }

            if let Some(caps) = INDEXED_SEGMENT.captures(segment) {
                let index = caps[2].parse::<usize>().map_err(|_| PathError::IndexOutOfRange {
                    path: path.to_string(),
                    index: caps[2].to_string(),
                })?;
                steps.push(PathStep::Key(caps[1].to_string()));
                steps.push(PathStep::Index(index));
            } else if segment.contains(['[', ']']) {
                return Err(PathError::MalformedSegment {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            } else {
                steps.push(PathStep::Key(segment.to_string()));
            }
        }

        Ok(Self {
            raw: path.to_string(),
            steps,
        })
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed traversal steps
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Walk the steps against `data`, failing fast on the first mismatch
    pub fn resolve<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.steps.iter().try_fold(data, |current, step| match (step, current) {
            (PathStep::Key(key), Value::Object(map)) => map.get(key),
            (PathStep::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Extract the value at `path`, or `None` when the path does not resolve.
///
/// Missing keys, type mismatches and unparsable paths are all silent misses.
pub fn extract<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    match FieldPath::parse(path) {
        Ok(parsed) => parsed.resolve(data),
        Err(e) => {
            debug!(path, error = %e, "extract: unparsable path");
            None
        }
    }
}
