//! Error types for qubo-model

use thiserror::Error;

use crate::vartype::Vartype;

/// Errors produced while building or manipulating models and sample sets
#[derive(Error, Debug)]
pub enum ModelError {
    /// A variable was referenced that the model or sample set does not contain
    #[error("unknown variable: {variable}")]
    UnknownVariable { variable: String },

    /// A variable label appeared twice where labels must be unique
    #[error("duplicate variable: {variable}")]
    DuplicateVariable { variable: String },

    /// A quadratic term joined a variable to itself
    #[error("self-loop on variable {variable} is not a quadratic interaction")]
    SelfLoop { variable: String },

    /// A sample value outside the vartype's domain
    #[error("value {value} is not in the {vartype} domain")]
    InvalidValue { value: i8, vartype: Vartype },

    /// Two collaborators disagreed on the value domain
    #[error("vartype mismatch: expected {expected}, found {found}")]
    VartypeMismatch { expected: Vartype, found: Vartype },

    /// Sample sets over different variable sets cannot be merged
    #[error("variable mismatch: expected {expected:?}, found {found:?}")]
    VariableMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Row/column counts disagree
    #[error("shape mismatch: {detail}")]
    ShapeMismatch { detail: String },

    /// JSON (de)serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
