//! Multi-call composite: repeat a child sampler call under fresh spin-reversal
//! transforms and merge the corrected results.
//!
//! Execution is two-phase:
//!
//! 1. [`MultiCallComposite::issue`] draws every mask, transforms the model
//!    once per call and dispatches all calls without waiting on any of them.
//! 2. [`PendingBatch::resolve`] waits for every call, corrects each response
//!    with its own mask and concatenates them in call order.
//!
//! The pipeline is agnostic to how the runtime schedules the dispatched
//! calls; `max_concurrent = 1` runs them one after another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use qubo_model::{BinaryQuadraticModel, SampleSet, Vartype};
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::aggregate_responses;
use crate::call_config::CallConfig;
use crate::config::MultiCallConfig;
use crate::corrector::correct_response;
use crate::error::{MultiCallError, MultiCallResult};
use crate::mask::{FlipMask, FlipMaskGenerator};
use crate::obs::{self, BatchSpan};
use crate::runner::{CallOutcome, PendingCall};
use crate::sampler::Sampler;
use crate::transform::transform_model;

/// Wraps a child [`Sampler`] and calls it once per supplied [`CallConfig`].
pub struct MultiCallComposite {
    child: Arc<dyn Sampler>,
    config: MultiCallConfig,
    generator: Mutex<FlipMaskGenerator>,
    permits: Arc<Semaphore>,
}

impl MultiCallComposite {
    pub fn new(child: Arc<dyn Sampler>, config: MultiCallConfig) -> MultiCallResult<Self> {
        config.validate()?;
        let generator = FlipMaskGenerator::new(config.seed, config.mask_strategy);
        let permits = Arc::new(Semaphore::new(config.max_concurrent));
        Ok(Self {
            child,
            config,
            generator: Mutex::new(generator),
            permits,
        })
    }

    pub fn child(&self) -> &Arc<dyn Sampler> {
        &self.child
    }

    pub fn config(&self) -> &MultiCallConfig {
        &self.config
    }

    /// The child's parameters, unchanged.
    pub fn parameters(&self) -> BTreeMap<String, Vec<String>> {
        self.child.parameters()
    }

    /// `{"child_properties": <child properties>}`.
    pub fn properties(&self) -> serde_json::Value {
        json!({ "child_properties": self.child.properties() })
    }

    /// Phase one: issue one child call per entry of `call_configs`.
    ///
    /// With spin reversal enabled every call gets its own random mask; all
    /// masks are drawn before the first call is dispatched. Must be called
    /// from within a Tokio runtime.
    pub fn issue(
        &self,
        bqm: &BinaryQuadraticModel,
        call_configs: Vec<CallConfig>,
    ) -> MultiCallResult<PendingBatch> {
        let masks = if self.config.spin_reversals {
            let mut generator = self
                .generator
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Some(generator.generate_batch(bqm.variables(), call_configs.len()))
        } else {
            None
        };
        self.dispatch(bqm, call_configs, masks)
    }

    /// Phase one with caller-chosen masks, one per call.
    ///
    /// The masks are applied whatever `spin_reversals` is set to. Every mask
    /// must cover exactly the model's variables.
    pub fn issue_with_masks(
        &self,
        bqm: &BinaryQuadraticModel,
        call_configs: Vec<CallConfig>,
        masks: Vec<FlipMask>,
    ) -> MultiCallResult<PendingBatch> {
        if masks.len() != call_configs.len() {
            return Err(MultiCallError::Configuration(format!(
                "{} masks supplied for {} calls",
                masks.len(),
                call_configs.len()
            )));
        }
        self.dispatch(bqm, call_configs, Some(masks))
    }

    /// Issue and resolve in one step.
    pub async fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        call_configs: Vec<CallConfig>,
    ) -> MultiCallResult<SampleSet> {
        self.issue(bqm, call_configs)?.resolve().await
    }

    fn dispatch(
        &self,
        bqm: &BinaryQuadraticModel,
        call_configs: Vec<CallConfig>,
        masks: Option<Vec<FlipMask>>,
    ) -> MultiCallResult<PendingBatch> {
        let batch_id = Uuid::new_v4().to_string();
        let issued_at = Utc::now();
        let _span = BatchSpan::enter(&batch_id);
        let spin_reversals = masks.is_some();

        // Everything that can fail deterministically fails before any call
        // reaches the child.
        let configs = call_configs
            .iter()
            .map(|config| config.merged_with(&self.config.shared))
            .collect::<MultiCallResult<Vec<_>>>()?;
        let prepared: Vec<(BinaryQuadraticModel, Option<FlipMask>)> = match masks {
            Some(masks) => masks
                .into_iter()
                .map(|mask| -> MultiCallResult<_> {
                    Ok((transform_model(bqm, &mask)?, Some(mask)))
                })
                .collect::<MultiCallResult<_>>()?,
            None => configs.iter().map(|_| (bqm.clone(), None)).collect(),
        };

        let mut calls = Vec::with_capacity(configs.len());
        for (call_index, (config, (model, mask))) in configs.into_iter().zip(prepared).enumerate() {
            calls.push(PendingCall::dispatch(
                call_index,
                Arc::clone(&self.child),
                model,
                config,
                mask,
                Arc::clone(&self.permits),
            )?);
        }

        obs::emit_batch_issued(&batch_id, calls.len(), spin_reversals, issued_at);

        Ok(PendingBatch {
            batch_id,
            vartype: bqm.vartype(),
            calls,
            issued_at,
            started: Instant::now(),
        })
    }
}

/// Every call of one batch, issued and not yet resolved.
#[derive(Debug)]
pub struct PendingBatch {
    batch_id: String,
    vartype: Vartype,
    calls: Vec<PendingCall>,
    issued_at: DateTime<Utc>,
    started: Instant,
}

impl PendingBatch {
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Pending calls in issue order.
    pub fn calls(&self) -> &[PendingCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Phase two: wait for every call, correct, aggregate.
    ///
    /// Every issued call runs to completion before anything is reported.
    /// If any call failed, the error of the earliest failing call is returned
    /// and nothing is aggregated.
    pub async fn resolve(self) -> MultiCallResult<SampleSet> {
        let span = tracing::info_span!("multicall.batch", batch_id = %self.batch_id);
        self.resolve_inner().instrument(span).await
    }

    async fn resolve_inner(self) -> MultiCallResult<SampleSet> {
        let num_calls = self.calls.len();

        let mut results = Vec::with_capacity(num_calls);
        for call in self.calls {
            results.push(call.wait().await);
        }
        let outcomes = results
            .into_iter()
            .collect::<MultiCallResult<Vec<CallOutcome>>>()?;

        let mut responses = Vec::with_capacity(num_calls);
        for CallOutcome {
            call_index,
            mut response,
            mask,
        } in outcomes
        {
            if let Some(mask) = mask {
                let corrected = correct_response(&mut response, &mask, self.vartype)
                    .map_err(|source| MultiCallError::Correction { call_index, source })?;
                obs::emit_response_corrected(call_index, corrected);
            }
            responses.push(response);
        }

        let merged = aggregate_responses(responses, self.vartype)?;
        obs::emit_batch_resolved(
            &self.batch_id,
            num_calls,
            merged.len(),
            self.started.elapsed().as_millis() as u64,
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskStrategy;
    use crate::sampler::SamplerResult;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Records the model and options of every call; answers all-high.
    #[derive(Default)]
    struct RecordingSampler {
        seen: StdMutex<Vec<(BinaryQuadraticModel, CallConfig)>>,
    }

    #[async_trait]
    impl Sampler for RecordingSampler {
        async fn sample(
            &self,
            bqm: &BinaryQuadraticModel,
            config: &CallConfig,
        ) -> SamplerResult<SampleSet> {
            self.seen.lock().unwrap().push((bqm.clone(), config.clone()));
            let [_, hi] = bqm.vartype().values();
            Ok(SampleSet::from_samples_bqm(
                bqm.variables().to_vec(),
                vec![vec![hi; bqm.num_variables()]],
                bqm,
            )?)
        }

        fn parameters(&self) -> BTreeMap<String, Vec<String>> {
            BTreeMap::from([("num_reads".to_string(), vec![])])
        }

        fn properties(&self) -> serde_json::Value {
            json!({ "kind": "recording" })
        }
    }

    fn model() -> BinaryQuadraticModel {
        BinaryQuadraticModel::from_ising(
            [("a", 0.5), ("b", -1.0), ("c", 0.25)],
            [(("a", "b"), 1.0), (("b", "c"), -2.0)],
            0.0,
        )
        .unwrap()
    }

    fn composite(child: Arc<RecordingSampler>, config: MultiCallConfig) -> MultiCallComposite {
        MultiCallComposite::new(child, config).unwrap()
    }

    #[test]
    fn test_zero_max_concurrent_is_rejected() {
        let result = MultiCallComposite::new(
            Arc::new(RecordingSampler::default()),
            MultiCallConfig::default().with_max_concurrent(0),
        );
        assert!(matches!(result, Err(MultiCallError::Configuration(_))));
    }

    #[test]
    fn test_parameters_and_properties_pass_through_child() {
        let sampler = composite(Arc::new(RecordingSampler::default()), MultiCallConfig::default());
        assert!(sampler.parameters().contains_key("num_reads"));
        assert_eq!(
            sampler.properties(),
            json!({ "child_properties": { "kind": "recording" } })
        );
    }

    #[tokio::test]
    async fn test_each_call_receives_its_own_transformed_model() {
        let child = Arc::new(RecordingSampler::default());
        let sampler = composite(Arc::clone(&child), MultiCallConfig::default().with_seed(11));
        let bqm = model();

        let batch = sampler.issue(&bqm, vec![CallConfig::new(); 3]).unwrap();
        let masks: Vec<FlipMask> = batch
            .calls()
            .iter()
            .map(|c| c.mask().cloned().unwrap())
            .collect();
        for (call, mask) in batch.calls().iter().zip(&masks) {
            assert_eq!(call.model(), &transform_model(&bqm, mask).unwrap());
        }
        batch.resolve().await.unwrap();

        let seen = child.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn test_disabled_spin_reversal_sends_original_model() {
        let child = Arc::new(RecordingSampler::default());
        let sampler = composite(
            Arc::clone(&child),
            MultiCallConfig::default().with_spin_reversals(false),
        );
        let bqm = model();

        let batch = sampler.issue(&bqm, vec![CallConfig::new(); 2]).unwrap();
        assert!(batch.calls().iter().all(|c| c.mask().is_none()));
        let merged = batch.resolve().await.unwrap();

        assert_eq!(merged.len(), 2);
        for (seen_model, _) in child.seen.lock().unwrap().iter() {
            assert_eq!(seen_model, &bqm);
        }
    }

    #[tokio::test]
    async fn test_shared_options_reach_every_call() {
        let child = Arc::new(RecordingSampler::default());
        let config = MultiCallConfig::default()
            .with_seed(1)
            .with_shared(CallConfig::new().with("num_reads", 4));
        let sampler = composite(Arc::clone(&child), config);

        sampler
            .sample(
                &model(),
                vec![CallConfig::new().with("tag", "x"), CallConfig::new().with("tag", "y")],
            )
            .await
            .unwrap();

        let seen = child.seen.lock().unwrap();
        let mut tags: Vec<String> = seen
            .iter()
            .map(|(_, c)| {
                assert_eq!(c.get("num_reads"), Some(&json!(4)));
                c.get("tag").and_then(|t| t.as_str()).unwrap().to_string()
            })
            .collect();
        tags.sort();
        assert_eq!(tags, ["x", "y"]);
    }

    #[tokio::test]
    async fn test_option_clash_fails_before_any_call() {
        let child = Arc::new(RecordingSampler::default());
        let config = MultiCallConfig::default().with_shared(CallConfig::new().with("seed", 1));
        let sampler = composite(Arc::clone(&child), config);

        let err = sampler
            .issue(&model(), vec![CallConfig::new(), CallConfig::new().with("seed", 2)])
            .unwrap_err();

        assert!(matches!(err, MultiCallError::Configuration(_)));
        assert!(child.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mask_count_must_match_call_count() {
        let sampler = composite(Arc::new(RecordingSampler::default()), MultiCallConfig::default());
        let bqm = model();
        let err = sampler
            .issue_with_masks(
                &bqm,
                vec![CallConfig::new(); 2],
                vec![FlipMask::identity(bqm.variables())],
            )
            .unwrap_err();
        assert!(matches!(err, MultiCallError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_bad_mask_fails_before_any_call() {
        let child = Arc::new(RecordingSampler::default());
        let sampler = composite(Arc::clone(&child), MultiCallConfig::default());
        let bqm = model();
        let good = FlipMask::identity(bqm.variables());
        let bad: FlipMask = [("a", true)].into_iter().collect();

        let err = sampler
            .issue_with_masks(&bqm, vec![CallConfig::new(); 2], vec![good, bad])
            .unwrap_err();

        assert!(matches!(err, MultiCallError::MaskDomain { .. }));
        assert!(child.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_antithetic_strategy_pairs_masks() {
        let sampler = composite(
            Arc::new(RecordingSampler::default()),
            MultiCallConfig::default()
                .with_seed(5)
                .with_mask_strategy(MaskStrategy::Antithetic),
        );
        let batch = sampler.issue(&model(), vec![CallConfig::new(); 4]).unwrap();
        let masks: Vec<&FlipMask> = batch.calls().iter().filter_map(|c| c.mask()).collect();
        assert_eq!(masks[1], &masks[0].complement());
        assert_eq!(masks[3], &masks[2].complement());
        batch.resolve().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_batch_resolves_to_empty_set_of_model_vartype() {
        let sampler = composite(Arc::new(RecordingSampler::default()), MultiCallConfig::default());
        let bqm = BinaryQuadraticModel::new(Vartype::Binary);
        let batch = sampler.issue(&bqm, Vec::new()).unwrap();
        assert!(batch.is_empty());
        let merged = batch.resolve().await.unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.vartype(), Vartype::Binary);
    }

    #[tokio::test]
    async fn test_batch_is_stamped_with_id_and_issue_time() {
        let sampler = composite(Arc::new(RecordingSampler::default()), MultiCallConfig::default());
        let before = Utc::now();
        let first = sampler.issue(&model(), vec![CallConfig::new()]).unwrap();
        let second = sampler.issue(&model(), vec![CallConfig::new()]).unwrap();
        let after = Utc::now();

        assert!(Uuid::parse_str(first.batch_id()).is_ok());
        assert_ne!(first.batch_id(), second.batch_id());
        assert!(first.issued_at() >= before && first.issued_at() <= after);
        assert!(second.issued_at() >= first.issued_at());

        first.resolve().await.unwrap();
        second.resolve().await.unwrap();
    }
}
