//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversion engine (batches, jobs, durations)
//! - Result store (artifacts stored, evicted, live)
//! - Cloud hand-off (uploads by result)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Engine Metrics
// =============================================================================

/// Batches accepted by the engine.
pub static BATCHES_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "convertino_batches_submitted_total",
        "Total conversion batches accepted",
    )
    .unwrap()
});

/// Batches rejected at submit time by reason.
pub static BATCHES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertino_batches_rejected_total",
            "Total conversion batches rejected by validation",
        ),
        &["reason"], // "empty_batch", "source_mismatch", "incompatible_target"
    )
    .unwrap()
});

/// Jobs created total.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("convertino_jobs_submitted_total", "Total conversion jobs created").unwrap()
});

/// Jobs that reached a terminal state, by state.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertino_jobs_finished_total",
            "Total conversion jobs that reached a terminal state",
        ),
        &["state"], // "succeeded", "failed", "cancelled"
    )
    .unwrap()
});

/// Transcode duration in seconds by media category.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "convertino_conversion_duration_seconds",
            "Duration of single-file transcodes",
        )
        .buckets(vec![
            0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
        &["category", "result"],
    )
    .unwrap()
});

// =============================================================================
// Result Store Metrics
// =============================================================================

/// Artifacts stored total.
pub static ARTIFACTS_STORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("convertino_artifacts_stored_total", "Total artifacts stored").unwrap()
});

/// Artifacts evicted after their TTL.
pub static ARTIFACTS_EVICTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "convertino_artifacts_evicted_total",
        "Total artifacts evicted after their TTL elapsed",
    )
    .unwrap()
});

/// Artifacts currently held.
pub static ARTIFACTS_LIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("convertino_artifacts_live", "Artifacts currently held in memory").unwrap()
});

// =============================================================================
// Cloud Metrics
// =============================================================================

/// Cloud uploads by result.
pub static CLOUD_UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_cloud_uploads_total", "Total cloud hand-off uploads"),
        &["result"], // "success", "rejected", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Engine
        Box::new(BATCHES_SUBMITTED.clone()),
        Box::new(BATCHES_REJECTED.clone()),
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Store
        Box::new(ARTIFACTS_STORED.clone()),
        Box::new(ARTIFACTS_EVICTED.clone()),
        Box::new(ARTIFACTS_LIVE.clone()),
        // Cloud
        Box::new(CLOUD_UPLOADS.clone()),
    ]
}
