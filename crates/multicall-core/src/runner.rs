//! Per-call dispatch to the child sampler.

use std::sync::Arc;
use std::time::Instant;

use qubo_model::{BinaryQuadraticModel, SampleSet};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::call_config::CallConfig;
use crate::error::{MultiCallError, MultiCallResult};
use crate::mask::FlipMask;
use crate::obs;
use crate::sampler::Sampler;

/// A response paired with the mask of the call that produced it.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub call_index: usize,
    pub response: SampleSet,
    /// `None` when spin reversal was disabled.
    pub mask: Option<FlipMask>,
}

/// Invoke the child sampler exactly once. No retries; a sampler error comes
/// back unchanged as the source of [`MultiCallError::Sampler`].
pub async fn run_call(
    sampler: &dyn Sampler,
    call_index: usize,
    bqm: &BinaryQuadraticModel,
    config: &CallConfig,
) -> MultiCallResult<SampleSet> {
    let start = Instant::now();
    match sampler.sample(bqm, config).await {
        Ok(response) => {
            obs::emit_call_completed(
                call_index,
                response.len(),
                start.elapsed().as_millis() as u64,
            );
            Ok(response)
        }
        Err(source) => {
            obs::emit_call_failed(call_index, &source);
            Err(MultiCallError::Sampler { call_index, source })
        }
    }
}

/// A call that has been handed to the child sampler but not yet awaited.
///
/// Owns its own transformed model, options and mask; nothing is shared with
/// other pending calls.
#[derive(Debug)]
pub struct PendingCall {
    call_index: usize,
    model: Arc<BinaryQuadraticModel>,
    config: CallConfig,
    mask: Option<FlipMask>,
    handle: JoinHandle<MultiCallResult<SampleSet>>,
}

impl PendingCall {
    /// Spawn the call on the current Tokio runtime and return immediately.
    ///
    /// The call starts once a permit from `permits` is available.
    pub fn dispatch(
        call_index: usize,
        sampler: Arc<dyn Sampler>,
        model: BinaryQuadraticModel,
        config: CallConfig,
        mask: Option<FlipMask>,
        permits: Arc<Semaphore>,
    ) -> MultiCallResult<Self> {
        let runtime = Handle::try_current().map_err(|e| MultiCallError::Dispatch {
            call_index,
            detail: format!("no async runtime available: {e}"),
        })?;

        let model = Arc::new(model);
        let task_model = Arc::clone(&model);
        let task_config = config.clone();
        let handle = runtime.spawn(
            async move {
                let _permit = permits.acquire_owned().await.ok();
                run_call(sampler.as_ref(), call_index, &task_model, &task_config).await
            }
            .in_current_span(),
        );

        obs::emit_call_dispatched(
            call_index,
            mask.as_ref().map(FlipMask::num_flipped),
            mask.as_ref().map(FlipMask::fingerprint).as_deref(),
        );

        Ok(Self {
            call_index,
            model,
            config,
            mask,
            handle,
        })
    }

    pub fn call_index(&self) -> usize {
        self.call_index
    }

    /// The model this call was dispatched with (transformed when a mask is set).
    pub fn model(&self) -> &BinaryQuadraticModel {
        &self.model
    }

    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    pub fn mask(&self) -> Option<&FlipMask> {
        self.mask.as_ref()
    }

    /// Wait for the response. Consumes the pending call.
    pub async fn wait(self) -> MultiCallResult<CallOutcome> {
        let call_index = self.call_index;
        let response = self
            .handle
            .await
            .map_err(|e| MultiCallError::Dispatch {
                call_index,
                detail: format!("sampler task join error: {e}"),
            })??;
        Ok(CallOutcome {
            call_index,
            response,
            mask: self.mask,
        })
    }
}
