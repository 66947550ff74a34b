//! Error types for the multi-call pipeline.

use qubo_model::{ModelError, Variable};
use thiserror::Error;

use crate::corrector::CorrectionError;
use crate::sampler::SamplerError;

/// Errors produced by the multi-call pipeline.
#[derive(Debug, Error)]
pub enum MultiCallError {
    /// Invalid pipeline or per-call configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A flip mask and a model disagree on the variable set.
    #[error("flip mask does not match model variables (missing: {missing:?}, unexpected: {unexpected:?})")]
    MaskDomain {
        missing: Vec<Variable>,
        unexpected: Vec<Variable>,
    },

    /// The child sampler failed; `source` is its error, unchanged.
    #[error("sampler call {call_index} failed: {source}")]
    Sampler {
        call_index: usize,
        #[source]
        source: SamplerError,
    },

    /// A response could not be corrected against the mask that produced it.
    #[error("cannot correct response of call {call_index}: {source}")]
    Correction {
        call_index: usize,
        #[source]
        source: CorrectionError,
    },

    /// The dispatched task for a call never produced a response.
    #[error("dispatch of call {call_index} failed: {detail}")]
    Dispatch { call_index: usize, detail: String },

    /// Corrected responses could not be merged.
    #[error("aggregation failed: {0}")]
    Aggregation(#[source] ModelError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// Result type for multi-call operations.
pub type MultiCallResult<T> = std::result::Result<T, MultiCallError>;
