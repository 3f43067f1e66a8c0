//! Shared pipeline state threaded through the ordered steps.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::resolve::UnboundVariableError;

/// Variable name → value. Grows as steps complete; never pruned during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineState {
    values: BTreeMap<String, Value>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Look up `name`, failing with the sorted list of bound names.
    pub fn require(&self, name: &str) -> Result<&Value, UnboundVariableError> {
        self.values.get(name).ok_or_else(|| UnboundVariableError {
            name: name.to_string(),
            bound: self.names().map(String::from).collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bind `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for PipelineState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        PipelineState {
            values: iter.into_iter().collect(),
        }
    }
}
