//! Prometheus metrics for fetches and batch runs.
//!
//! This module provides metrics for:
//! - Leaf fetches (per stage: result counts, latency)
//! - Batch runs (per strategy: runs, member outcomes)

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

use crate::fetch::Stage;
use crate::orchestrator::Strategy;

/// Registry holding every chainfetch metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Fetch requests total by stage and result.
pub static FETCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainfetch_fetch_requests_total", "Total fetch requests"),
        &["stage", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Fetch duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "chainfetch_fetch_duration_seconds",
            "Duration of individual fetch calls",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch runs total by strategy.
pub static BATCH_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chainfetch_batch_runs_total", "Total batch runs"),
        &["strategy"],
    )
    .unwrap()
});

/// Batch members total by strategy and final outcome.
pub static BATCH_MEMBERS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chainfetch_batch_members_total",
            "Total batch members by final outcome",
        ),
        &["strategy", "result"], // result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FETCH_REQUESTS.clone()),
        Box::new(FETCH_DURATION.clone()),
        Box::new(BATCH_RUNS.clone()),
        Box::new(BATCH_MEMBERS.clone()),
    ]
}

/// Register every metric in `registry`.
pub fn register_metrics(registry: &Registry) {
    for metric in all_metrics() {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Record one finished fetch call.
pub fn record_fetch(stage: Stage, success: bool, elapsed: Duration) {
    FETCH_REQUESTS
        .with_label_values(&[stage.as_str(), result_label(success)])
        .inc();
    FETCH_DURATION
        .with_label_values(&[stage.as_str()])
        .observe(elapsed.as_secs_f64());
}

/// Record one finished batch run.
pub fn record_batch(strategy: Strategy, succeeded: usize, failed: usize) {
    BATCH_RUNS.with_label_values(&[strategy.as_str()]).inc();
    BATCH_MEMBERS
        .with_label_values(&[strategy.as_str(), "success"])
        .inc_by(succeeded as u64);
    BATCH_MEMBERS
        .with_label_values(&[strategy.as_str(), "error"])
        .inc_by(failed as u64);
}

fn result_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
