//! Structured observability hooks for batch lifecycle events.
//!
//! This module provides:
//! - Batch-scoped tracing spans via the `BatchSpan` RAII guard
//! - Emission functions for issue, dispatch, completion, correction and resolve
//!
//! Events are emitted at `info!` level, failures at `warn!`.
//! Filter with `RUST_LOG`, e.g. `RUST_LOG=multicall_core=debug`.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// RAII guard that enters a batch-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = BatchSpan::enter("4f1c...");
/// // every event emitted here carries batch_id = "4f1c..."
/// ```
pub struct BatchSpan {
    _span: tracing::span::EnteredSpan,
}

impl BatchSpan {
    /// Create and enter a span tagged with the batch id.
    pub fn enter(batch_id: &str) -> Self {
        let span = tracing::info_span!("multicall.batch", batch_id = %batch_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: every call of a batch has been issued.
pub fn emit_batch_issued(
    batch_id: &str,
    num_calls: usize,
    spin_reversals: bool,
    issued_at: DateTime<Utc>,
) {
    info!(
        event = "batch.issued",
        batch_id = %batch_id,
        num_calls = num_calls,
        spin_reversals = spin_reversals,
        issued_at = %issued_at.to_rfc3339(),
    );
}

/// Emit event: one call handed to the child sampler.
pub fn emit_call_dispatched(call_index: usize, num_flipped: Option<usize>, mask: Option<&str>) {
    debug!(
        event = "call.dispatched",
        call_index = call_index,
        num_flipped = ?num_flipped,
        mask = mask.unwrap_or("none"),
    );
}

/// Emit event: the child sampler returned a response.
pub fn emit_call_completed(call_index: usize, num_samples: usize, duration_ms: u64) {
    debug!(
        event = "call.completed",
        call_index = call_index,
        num_samples = num_samples,
        duration_ms = duration_ms,
    );
}

/// Emit event: the child sampler failed (warning level).
pub fn emit_call_failed(call_index: usize, error: &dyn std::fmt::Display) {
    warn!(event = "call.failed", call_index = call_index, error = %error);
}

/// Emit event: a response's flipped columns were complemented.
pub fn emit_response_corrected(call_index: usize, corrected_columns: usize) {
    debug!(
        event = "response.corrected",
        call_index = call_index,
        corrected_columns = corrected_columns,
    );
}

/// Emit event: the batch resolved into one aggregate.
pub fn emit_batch_resolved(batch_id: &str, num_calls: usize, num_samples: usize, duration_ms: u64) {
    info!(
        event = "batch.resolved",
        batch_id = %batch_id,
        num_calls = num_calls,
        num_samples = num_samples,
        duration_ms = duration_ms,
    );
}
