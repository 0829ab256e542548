//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Session lifecycle (admissions, separations, stem downloads)
//! - Archive packaging
//! - Expiry sweeps

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Session Lifecycle Metrics
// =============================================================================

/// Sessions admitted past the quota check.
pub static SESSIONS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_sessions_created_total",
        "Total sessions admitted since startup",
    )
    .unwrap()
});

/// Separation runs by terminal outcome.
pub static SEPARATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_separations_total", "Total separation runs"),
        &["result"], // "ready", "failed", "timed_out"
    )
    .unwrap()
});

/// End-to-end duration of successful separations in seconds.
pub static SEPARATION_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "stemsplit_separation_duration_seconds",
            "Duration of successful separations",
        )
        .buckets(vec![5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

/// Admissions denied because the monthly limit was reached.
pub static QUOTA_DENIALS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_quota_denials_total",
        "Total admissions denied by the quota ledger",
    )
    .unwrap()
});

/// Stem downloads that failed after a completed separation.
pub static STEM_DOWNLOAD_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_stem_download_failures_total",
        "Total stem downloads that failed",
    )
    .unwrap()
});

// =============================================================================
// Packaging Metrics
// =============================================================================

/// Download archives built by kind.
pub static ARCHIVES_BUILT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_archives_built_total", "Total archives built"),
        &["kind"], // "stems", "mixdown"
    )
    .unwrap()
});

// =============================================================================
// Sweeper Metrics
// =============================================================================

/// Expiry sweep runs.
pub static SWEEPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("stemsplit_sweeps_total", "Total expiry sweep runs").unwrap()
});

/// Sessions removed by the expiry sweeper.
pub static SWEPT_SESSIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_swept_sessions_total",
        "Total sessions removed by the expiry sweeper",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Session lifecycle
        Box::new(SESSIONS_CREATED_TOTAL.clone()),
        Box::new(SEPARATIONS_TOTAL.clone()),
        Box::new(SEPARATION_DURATION_SECONDS.clone()),
        Box::new(QUOTA_DENIALS_TOTAL.clone()),
        Box::new(STEM_DOWNLOAD_FAILURES_TOTAL.clone()),
        // Packaging
        Box::new(ARCHIVES_BUILT_TOTAL.clone()),
        // Sweeper
        Box::new(SWEEPS_TOTAL.clone()),
        Box::new(SWEPT_SESSIONS_TOTAL.clone()),
    ]
}
