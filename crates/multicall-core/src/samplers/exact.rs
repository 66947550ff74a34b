//! Exhaustive enumeration sampler for small models.

use async_trait::async_trait;
use qubo_model::{BinaryQuadraticModel, SampleSet};
use serde_json::json;

use crate::call_config::CallConfig;
use crate::sampler::{Sampler, SamplerError, SamplerResult};

/// Largest model [`ExactSolver`] will enumerate.
pub const MAX_EXACT_VARIABLES: usize = 20;

/// Returns every assignment of the model's variables, one row each.
///
/// Row `k` assigns the high value to variable `i` when bit `i` of `k` is set.
/// A model without variables yields an empty sample set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl ExactSolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sampler for ExactSolver {
    async fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        _config: &CallConfig,
    ) -> SamplerResult<SampleSet> {
        let n = bqm.num_variables();
        if n > MAX_EXACT_VARIABLES {
            return Err(SamplerError::TooManyVariables {
                num_variables: n,
                limit: MAX_EXACT_VARIABLES,
            });
        }
        if n == 0 {
            return Ok(SampleSet::empty(bqm.vartype()));
        }

        let [low, high] = bqm.vartype().values();
        let rows = (0..1u64 << n)
            .map(|bits| {
                (0..n)
                    .map(|i| if bits >> i & 1 == 1 { high } else { low })
                    .collect()
            })
            .collect();

        Ok(SampleSet::from_samples_bqm(
            bqm.variables().to_vec(),
            rows,
            bqm,
        )?)
    }

    fn properties(&self) -> serde_json::Value {
        json!({ "max_variables": MAX_EXACT_VARIABLES })
    }
}
