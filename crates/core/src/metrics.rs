//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Registrar calls (latency, outcomes)
//! - State machine transitions
//! - Store write retries and unrecorded outcomes
//! - Escalation notifications

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Registrar Metrics
// =============================================================================

/// Registrar request duration in seconds.
pub static REGISTRAR_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "enasub_registrar_request_duration_seconds",
            "Duration of registrar requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["operation"], // "create", "check"
    )
    .unwrap()
});

/// Registrar calls by operation and outcome.
pub static REGISTRAR_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("enasub_registrar_requests_total", "Total registrar calls"),
        &["operation", "outcome"], // outcome: "results", "pending", "errors"
    )
    .unwrap()
});

// =============================================================================
// Reconciler Metrics
// =============================================================================

/// Status transitions written, by machine and target status.
pub static TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "enasub_transitions_total",
            "Status transitions written to the store",
        ),
        &["machine", "to"], // machine: "submission", "assembly"
    )
    .unwrap()
});

/// Store writes that failed and were retried.
pub static STORE_WRITE_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "enasub_store_write_retries_total",
        "Store writes retried after a failure",
    )
    .unwrap()
});

/// Store writes that failed after every attempt.
pub static STORE_WRITE_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "enasub_store_write_exhausted_total",
        "Store writes that failed after all retries",
    )
    .unwrap()
});

/// Registrar outcomes waiting to be recorded.
pub static UNRECORDED_OUTCOMES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "enasub_unrecorded_outcomes",
        "Registrar create outcomes not yet written to the store",
    )
    .unwrap()
});

/// Confirm passes skipped because the check interval had not elapsed.
pub static CONFIRM_BATCHES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "enasub_confirm_batches_skipped_total",
        "Confirm passes skipped by the registrar rate limit",
    )
    .unwrap()
});

/// Reconcile cycles by result.
pub static CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("enasub_cycles_total", "Reconcile cycles run"),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Escalation Metrics
// =============================================================================

/// Notifications delivered, by kind.
pub static NOTIFICATIONS_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "enasub_notifications_sent_total",
            "Operator notifications delivered",
        ),
        &["kind"], // "stuck", "waiting"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Registrar
        Box::new(REGISTRAR_REQUEST_DURATION.clone()),
        Box::new(REGISTRAR_REQUESTS.clone()),
        // Reconciler
        Box::new(TRANSITIONS.clone()),
        Box::new(STORE_WRITE_RETRIES.clone()),
        Box::new(STORE_WRITE_EXHAUSTED.clone()),
        Box::new(UNRECORDED_OUTCOMES.clone()),
        Box::new(CONFIRM_BATCHES_SKIPPED.clone()),
        Box::new(CYCLES.clone()),
        // Escalation
        Box::new(NOTIFICATIONS_SENT.clone()),
    ]
}
