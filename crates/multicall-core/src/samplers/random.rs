//! Uniform random sampler.

use std::collections::BTreeMap;

use async_trait::async_trait;
use qubo_model::{BinaryQuadraticModel, SampleSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::call_config::CallConfig;
use crate::sampler::{u64_option, Sampler, SamplerError, SamplerResult};

pub const DEFAULT_NUM_READS: u64 = 10;

/// Draws each variable uniformly and independently.
///
/// Options: `num_reads` (rows per call, default [`DEFAULT_NUM_READS`]) and
/// `seed` (entropy-seeded when absent).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl RandomSampler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sampler for RandomSampler {
    async fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        config: &CallConfig,
    ) -> SamplerResult<SampleSet> {
        let num_reads = u64_option(config, "num_reads")?.unwrap_or(DEFAULT_NUM_READS);
        if num_reads == 0 {
            return Err(SamplerError::InvalidParameter {
                name: "num_reads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let mut rng = match u64_option(config, "seed")? {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let [low, high] = bqm.vartype().values();
        let n = bqm.num_variables();
        let rows = (0..num_reads)
            .map(|_| {
                (0..n)
                    .map(|_| if rng.gen_bool(0.5) { high } else { low })
                    .collect()
            })
            .collect();

        Ok(SampleSet::from_samples_bqm(
            bqm.variables().to_vec(),
            rows,
            bqm,
        )?)
    }

    fn parameters(&self) -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            ("num_reads".to_string(), Vec::new()),
            ("seed".to_string(), Vec::new()),
        ])
    }

    fn properties(&self) -> serde_json::Value {
        json!({ "default_num_reads": DEFAULT_NUM_READS })
    }
}
