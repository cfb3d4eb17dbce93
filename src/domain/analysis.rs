//! Results returned by external analysis engines.
//!
//! Engines answer with arbitrarily nested JSON. It is normalized into a
//! tagged tree so consumers match exhaustively instead of probing untyped
//! maps:
//! - `AnalysisValue::Scalar`: a number, string, bool or missing marker
//! - `AnalysisValue::Sequence`: an ordered, flat list of scalars
//! - `AnalysisValue::Mapping`: a nested [`AnalysisResult`]

use crate::domain::error::ExternalEngineError;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisValue {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
    Mapping(AnalysisResult),
}

/// Ordered map of result key to value. Empty when an engine failed or
/// produced nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    entries: IndexMap<String, AnalysisValue>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result holding one value under `key`.
    pub fn single(key: &str, value: AnalysisValue) -> Self {
        let mut result = Self::empty();
        result.insert(key, value);
        result
    }

    pub fn insert(&mut self, key: &str, value: AnalysisValue) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AnalysisValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnalysisValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, AnalysisValue)> for AnalysisResult {
    fn from_iter<T: IntoIterator<Item = (String, AnalysisValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Converts any engine value into the result tree.
///
/// Objects become mappings. Arrays are flattened into one sequence when every
/// leaf is a scalar; an array holding objects becomes a mapping keyed by
/// element index.
pub fn normalize_value(value: &Value) -> AnalysisValue {
    match value {
        Value::Object(map) => AnalysisValue::Mapping(normalize_object(map)),
        Value::Array(items) => {
            let mut leaves = Vec::new();
            if flatten_scalars(items, &mut leaves) {
                AnalysisValue::Sequence(leaves)
            } else {
                AnalysisValue::Mapping(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), normalize_value(v)))
                        .collect(),
                )
            }
        }
        other => AnalysisValue::Scalar(to_scalar(other)),
    }
}

/// Normalizes a value that must be a keyed mapping at the top level.
/// `null` and `[]` mean the engine produced nothing.
pub fn normalize_mapping(value: &Value) -> Result<AnalysisResult, ExternalEngineError> {
    match value {
        Value::Null => Ok(AnalysisResult::empty()),
        Value::Array(items) if items.is_empty() => Ok(AnalysisResult::empty()),
        Value::Object(map) => Ok(normalize_object(map)),
        other => Err(ExternalEngineError::MalformedOutput {
            reason: format!("expected a JSON object, got {}", json_kind(other)),
        }),
    }
}

fn normalize_object(map: &serde_json::Map<String, Value>) -> AnalysisResult {
    map.iter()
        .map(|(k, v)| (k.clone(), normalize_value(v)))
        .collect()
}

fn flatten_scalars(items: &[Value], out: &mut Vec<Scalar>) -> bool {
    for item in items {
        match item {
            Value::Object(_) => return false,
            Value::Array(nested) => {
                if !flatten_scalars(nested, out) {
                    return false;
                }
            }
            scalar => out.push(to_scalar(scalar)),
        }
    }
    true
}

fn to_scalar(value: &Value) -> Scalar {
    match value {
        Value::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Missing),
        Value::String(s) => Scalar::Text(s.clone()),
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Null | Value::Array(_) | Value::Object(_) => Scalar::Missing,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
