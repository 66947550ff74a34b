//! Observability tests for multi-call batch tracing.
//!
//! These tests verify that structured tracing events are emitted for the
//! batch lifecycle: issue, per-call dispatch and completion, correction,
//! failure and resolve.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use multicall_core::obs::{
    emit_batch_issued, emit_batch_resolved, emit_call_failed, emit_response_corrected, BatchSpan,
};
use multicall_core::{CallConfig, ExactSolver, MultiCallComposite, MultiCallConfig};
use qubo_model::BinaryQuadraticModel;
use tracing_test::traced_test;

fn model() -> BinaryQuadraticModel {
    BinaryQuadraticModel::from_ising([("a", 1.0), ("b", -1.0)], [(("a", "b"), 0.5)], 0.0)
        .unwrap()
}

#[traced_test]
#[test]
fn test_emit_batch_issued_logs_call_count_and_issue_time() {
    let issued_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    emit_batch_issued("batch-1", 3, true, issued_at);
    assert!(logs_contain("batch.issued"));
    assert!(logs_contain("num_calls=3"));
    assert!(logs_contain("issued_at=2026-03-14T09:26:53+00:00"));
}

#[traced_test]
#[test]
fn test_emit_call_failed_logs_warning() {
    let error = "solver unreachable";
    emit_call_failed(2, &error);
    assert!(logs_contain("WARN"));
    assert!(logs_contain("solver unreachable"));
}

#[traced_test]
#[test]
fn test_batch_span_tags_events_with_batch_id() {
    let span = BatchSpan::enter("batch-span-7");
    emit_response_corrected(0, 2);
    emit_batch_resolved("batch-span-7", 1, 4, 12);
    drop(span);
    assert!(logs_contain("batch-span-7"));
    assert!(logs_contain("response.corrected"));
}

#[traced_test]
#[tokio::test]
async fn test_sample_emits_lifecycle_events() {
    let sampler = MultiCallComposite::new(
        Arc::new(ExactSolver),
        MultiCallConfig::default().with_seed(1),
    )
    .unwrap();

    let merged = sampler
        .sample(&model(), vec![CallConfig::new(), CallConfig::new()])
        .await
        .unwrap();

    assert_eq!(merged.len(), 8);
    assert!(logs_contain("batch.issued"));
    assert!(logs_contain("issued_at="));
    assert!(logs_contain("call.dispatched"));
    assert!(logs_contain("call.completed"));
    assert!(logs_contain("batch.resolved"));
}
