//! The child sampler seam.
//!
//! The pipeline never samples by itself; every call goes through an injected
//! [`Sampler`]. Implement it to plug in a real solver backend, one of the
//! reference samplers in [`crate::samplers`], or a test stub.

use std::collections::BTreeMap;

use async_trait::async_trait;
use qubo_model::{BinaryQuadraticModel, ModelError, SampleSet};
use thiserror::Error;

use crate::call_config::CallConfig;

/// Errors raised by a sampler. The pipeline passes these through unchanged.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("model has {num_variables} variables, more than the supported {limit}")]
    TooManyVariables { num_variables: usize, limit: usize },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Anything a solver backend reports.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result type for sampler calls.
pub type SamplerResult<T> = std::result::Result<T, SamplerError>;

/// Draws samples from a binary quadratic model.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Sample `bqm` once with the given options. The returned set may list
    /// its variables in any order.
    async fn sample(&self, bqm: &BinaryQuadraticModel, config: &CallConfig)
        -> SamplerResult<SampleSet>;

    /// Option names this sampler accepts, each with descriptive tags.
    fn parameters(&self) -> BTreeMap<String, Vec<String>> {
        BTreeMap::new()
    }

    /// Static facts about the sampler.
    fn properties(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }
}

/// Read an optional non-negative integer option.
pub fn u64_option(config: &CallConfig, name: &str) -> SamplerResult<Option<u64>> {
    match config.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| SamplerError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected a non-negative integer, got {value}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_option_absent_or_null_is_none() {
        let config = CallConfig::new().with("seed", serde_json::Value::Null);
        assert_eq!(u64_option(&config, "seed").unwrap(), None);
        assert_eq!(u64_option(&config, "num_reads").unwrap(), None);
    }

    #[test]
    fn test_u64_option_rejects_negative() {
        let config = CallConfig::new().with("num_reads", -3);
        let err = u64_option(&config, "num_reads").unwrap_err();
        assert!(matches!(err, SamplerError::InvalidParameter { name, .. } if name == "num_reads"));
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err: SamplerError = anyhow::anyhow!("qpu offline").into();
        assert_eq!(err.to_string(), "qpu offline");
    }
}
