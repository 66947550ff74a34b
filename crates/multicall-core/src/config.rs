//! Composite configuration.

use serde::{Deserialize, Serialize};

use crate::call_config::CallConfig;
use crate::error::{MultiCallError, MultiCallResult};
use crate::mask::MaskStrategy;

pub const ENV_SPIN_REVERSALS: &str = "MULTICALL_SPIN_REVERSALS";
pub const ENV_SEED: &str = "MULTICALL_SEED";
pub const ENV_MAX_CONCURRENT: &str = "MULTICALL_MAX_CONCURRENT";
pub const ENV_MASK_STRATEGY: &str = "MULTICALL_MASK_STRATEGY";

/// Settings for a [`MultiCallComposite`](crate::MultiCallComposite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiCallConfig {
    /// Apply a fresh spin-reversal transform to every call.
    pub spin_reversals: bool,
    /// Seed for mask generation; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Maximum number of child calls in flight at once.
    pub max_concurrent: usize,
    pub mask_strategy: MaskStrategy,
    /// Options merged into every call's options.
    pub shared: CallConfig,
}

impl Default for MultiCallConfig {
    fn default() -> Self {
        Self {
            spin_reversals: true,
            seed: None,
            max_concurrent: 4,
            mask_strategy: MaskStrategy::Independent,
            shared: CallConfig::new(),
        }
    }
}

impl MultiCallConfig {
    pub fn with_spin_reversals(mut self, enabled: bool) -> Self {
        self.spin_reversals = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_mask_strategy(mut self, strategy: MaskStrategy) -> Self {
        self.mask_strategy = strategy;
        self
    }

    pub fn with_shared(mut self, shared: CallConfig) -> Self {
        self.shared = shared;
        self
    }

    pub fn validate(&self) -> MultiCallResult<()> {
        if self.max_concurrent == 0 {
            return Err(MultiCallError::Configuration(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - MULTICALL_SPIN_REVERSALS (optional, default: "true")
    /// - MULTICALL_SEED (optional, unset: entropy-seeded)
    /// - MULTICALL_MAX_CONCURRENT (optional, default: 4)
    /// - MULTICALL_MASK_STRATEGY (optional, "independent" | "antithetic")
    pub fn from_env() -> MultiCallResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MultiCallResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SPIN_REVERSALS) {
            config.spin_reversals = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(ENV_SPIN_REVERSALS, &raw)),
            };
        }
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = Some(raw.trim().parse().map_err(|_| invalid(ENV_SEED, &raw))?);
        }
        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            config.max_concurrent = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_MAX_CONCURRENT, &raw))?;
        }
        if let Some(raw) = lookup(ENV_MASK_STRATEGY) {
            config.mask_strategy = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, raw: &str) -> MultiCallError {
    MultiCallError::Configuration(format!("{key} has invalid value '{raw}'"))
}
