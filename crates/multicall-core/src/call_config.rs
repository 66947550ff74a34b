//! Opaque per-call sampler options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MultiCallError, MultiCallResult};

/// Keyword options handed to the child sampler for one call.
///
/// The pipeline never interprets these; it only merges in the composite's
/// shared options before dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallConfig(Map<String, Value>);

impl CallConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This call's options plus every `shared` option.
    ///
    /// A key set both per call and in `shared` is rejected rather than
    /// silently overridden.
    pub fn merged_with(&self, shared: &CallConfig) -> MultiCallResult<CallConfig> {
        let mut merged = self.clone();
        for (key, value) in &shared.0 {
            if merged.contains_key(key) {
                return Err(MultiCallError::Configuration(format!(
                    "option '{key}' is set both per call and for every call"
                )));
            }
            merged.0.insert(key.clone(), value.clone());
        }
        Ok(merged)
    }
}

impl From<Map<String, Value>> for CallConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for CallConfig {
    type Error = MultiCallError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(MultiCallError::Configuration(format!(
                "call options must be a JSON object, got {other}"
            ))),
        }
    }
}
