//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Download sessions (jobs started, finished, failed by reason)
//! - Placement (files placed by kind)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Session - Job Metrics
// =============================================================================

/// Jobs started total.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("chapterbay_jobs_started_total", "Total download jobs started").unwrap()
});

/// Jobs completed total.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chapterbay_jobs_completed_total",
        "Total download jobs that finished and placed their files",
    )
    .unwrap()
});

/// Jobs failed total by reason.
pub static JOBS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chapterbay_jobs_failed_total", "Total download jobs that did not complete"),
        &["reason"], // "timeout", "cancelled", "fetch", "transfer", "placement"
    )
    .unwrap()
});

/// Bytes retrieved by finished jobs.
pub static BYTES_TRANSFERRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chapterbay_bytes_transferred_total",
        "Total bytes retrieved by finished jobs",
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("chapterbay_job_duration_seconds", "Duration of download jobs")
            .buckets(vec![5.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Placement Metrics
// =============================================================================

/// Files placed total by kind.
pub static FILES_PLACED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chapterbay_files_placed_total", "Total files moved into the library"),
        &["kind"], // "placed", "stray", "quarantined"
    )
    .unwrap()
});

/// Placement failures total.
pub static PLACEMENT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chapterbay_placement_failures_total",
        "Total files that could not be placed even in quarantine",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(BYTES_TRANSFERRED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Placement
        Box::new(FILES_PLACED.clone()),
        Box::new(PLACEMENT_FAILURES.clone()),
    ]
}
