//! Flip masks: which variables a call's spin-reversal transform reverses.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use qubo_model::Variable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MultiCallError, MultiCallResult};

/// Variable → flipped? for one call.
///
/// The domain is exactly the model's variable set at generation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlipMask {
    flips: BTreeMap<Variable, bool>,
}

impl FlipMask {
    /// A mask over `variables` that flips nothing.
    pub fn identity(variables: &[Variable]) -> Self {
        variables.iter().map(|v| (v.clone(), false)).collect()
    }

    /// `Some(flipped)` for variables in the mask's domain.
    pub fn get(&self, v: &str) -> Option<bool> {
        self.flips.get(v).copied()
    }

    pub fn is_flipped(&self, v: &str) -> bool {
        self.get(v).unwrap_or(false)
    }

    /// Variables this mask reverses.
    pub fn flipped(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.flips
            .iter()
            .filter(|(_, &flip)| flip)
            .map(|(v, _)| v)
    }

    /// Every variable in the mask's domain.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.flips.keys()
    }

    pub fn len(&self) -> usize {
        self.flips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }

    pub fn num_flipped(&self) -> usize {
        self.flipped().count()
    }

    /// True when the mask flips nothing.
    pub fn is_identity(&self) -> bool {
        self.num_flipped() == 0
    }

    /// The mask that flips exactly the variables this one leaves alone.
    pub fn complement(&self) -> Self {
        self.flips.iter().map(|(v, &flip)| (v.clone(), !flip)).collect()
    }

    /// Require the mask's domain to equal `variables`.
    pub fn check_domain(&self, variables: &[Variable]) -> MultiCallResult<()> {
        let expected: HashSet<&str> = variables.iter().map(String::as_str).collect();
        let missing: Vec<Variable> = variables
            .iter()
            .filter(|v| !self.flips.contains_key(v.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<Variable> = self
            .flips
            .keys()
            .filter(|v| !expected.contains(v.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(MultiCallError::MaskDomain {
                missing,
                unexpected,
            })
        }
    }

    /// Short SHA-256 digest of the flip pattern, for log correlation.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (v, &flip) in &self.flips {
            hasher.update(v.as_bytes());
            hasher.update(if flip { b"=1\n" } else { b"=0\n" });
        }
        let digest = hex::encode(hasher.finalize());
        digest[..12].to_string()
    }
}

impl<V: Into<Variable>> FromIterator<(V, bool)> for FlipMask {
    fn from_iter<I: IntoIterator<Item = (V, bool)>>(iter: I) -> Self {
        Self {
            flips: iter.into_iter().map(|(v, flip)| (v.into(), flip)).collect(),
        }
    }
}

/// How masks for the calls of one batch relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Every call draws a fresh mask, each variable flipped with probability 1/2.
    #[default]
    Independent,
    /// Calls 1, 3, 5, ... use the complement of the preceding call's mask, so
    /// each variable is flipped in exactly one call of every pair.
    Antithetic,
}

impl FromStr for MaskStrategy {
    type Err = MultiCallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(MaskStrategy::Independent),
            "antithetic" => Ok(MaskStrategy::Antithetic),
            other => Err(MultiCallError::Configuration(format!(
                "unknown mask strategy '{other}' (expected 'independent' or 'antithetic')"
            ))),
        }
    }
}

impl std::fmt::Display for MaskStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaskStrategy::Independent => write!(f, "independent"),
            MaskStrategy::Antithetic => write!(f, "antithetic"),
        }
    }
}

/// Draws flip masks from a uniform random source.
#[derive(Debug)]
pub struct FlipMaskGenerator {
    rng: StdRng,
    strategy: MaskStrategy,
}

impl FlipMaskGenerator {
    /// Seeded generators are reproducible; `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>, strategy: MaskStrategy) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, strategy }
    }

    /// One mask over `variables`, each flipped independently with probability 1/2.
    pub fn generate(&mut self, variables: &[Variable]) -> FlipMask {
        variables
            .iter()
            .map(|v| (v.clone(), self.rng.gen_bool(0.5)))
            .collect()
    }

    /// Masks for `num_calls` calls, following the configured strategy.
    pub fn generate_batch(&mut self, variables: &[Variable], num_calls: usize) -> Vec<FlipMask> {
        let mut masks: Vec<FlipMask> = Vec::with_capacity(num_calls);
        for call_index in 0..num_calls {
            let mask = match self.strategy {
                MaskStrategy::Antithetic if call_index % 2 == 1 => {
                    masks[call_index - 1].complement()
                }
                _ => self.generate(variables),
            };
            masks.push(mask);
        }
        masks
    }
}
