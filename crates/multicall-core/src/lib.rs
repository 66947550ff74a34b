//! Multicall Core Library
//!
//! Calls a child sampler several times on one model, each call under its own
//! random spin-reversal transform, and merges the corrected responses into a
//! single sample set.
//!
//! ## Pipeline
//!
//! - `mask`: draw one `FlipMask` per call
//! - `transform`: flip the masked variables of a model copy
//! - `runner`: dispatch each call as a task bounded by a semaphore
//! - `corrector`: map each response back to the original model's labels
//! - `aggregator`: concatenate the responses in call order
//!
//! `composite::MultiCallComposite` ties these together behind a two-phase
//! `issue` / `resolve` API.

pub mod aggregator;
pub mod call_config;
pub mod composite;
pub mod config;
pub mod corrector;
pub mod error;
pub mod mask;
pub mod obs;
pub mod runner;
pub mod sampler;
pub mod samplers;
pub mod telemetry;
pub mod transform;

pub use aggregator::aggregate_responses;
pub use call_config::CallConfig;
pub use composite::{MultiCallComposite, PendingBatch};
pub use config::MultiCallConfig;
pub use corrector::{complement, correct_response, corrected, CorrectionError};
pub use error::{MultiCallError, MultiCallResult};
pub use mask::{FlipMask, FlipMaskGenerator, MaskStrategy};
pub use runner::{run_call, CallOutcome, PendingCall};
pub use sampler::{Sampler, SamplerError, SamplerResult};
pub use samplers::{ExactSolver, RandomSampler};
pub use telemetry::init_tracing;
pub use transform::transform_model;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
