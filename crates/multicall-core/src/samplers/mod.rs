//! Reference samplers for running the pipeline without a solver backend.

mod exact;
mod random;

pub use exact::{ExactSolver, MAX_EXACT_VARIABLES};
pub use random::{RandomSampler, DEFAULT_NUM_READS};
