//! Qubo-Model: binary quadratic models and sample sets
//!
//! The data layer the multi-call pipeline runs against.
//!
//! ## Key Components
//!
//! - `BinaryQuadraticModel`: ordered variables, linear/quadratic biases and
//!   the single-variable `flip_variable` relabeling
//! - `SampleSet`: one sampler response (labels, sample matrix, energies)
//! - `SampleSet::concatenate`: the merge primitive that reconciles differing
//!   column orders

mod bqm;
mod error;
mod sampleset;
mod vartype;

pub use bqm::{BinaryQuadraticModel, BqmDocument};
pub use error::ModelError;
pub use sampleset::{SampleMatrix, SampleRecord, SampleSet};
pub use vartype::Vartype;

/// Variable label.
pub type Variable = String;

/// Result type for qubo-model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;
