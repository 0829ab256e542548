//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the StemSplit server:
//! - HTTP request metrics (latency, counts, errors)
//! - Authentication failures
//! - Session and sweeper status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stemsplit_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stemsplit_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Session Metrics (collected dynamically)
// =============================================================================

/// Session output directories currently on disk.
pub static SESSIONS_ON_DISK: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_sessions_on_disk",
        "Number of session output directories currently on disk",
    )
    .unwrap()
});

/// Sweeper running state (1 = running, 0 = stopped).
pub static SWEEPER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_sweeper_running",
        "Whether the expiry sweeper loop is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Sessions
    registry
        .register(Box::new(SESSIONS_ON_DISK.clone()))
        .unwrap();
    registry
        .register(Box::new(SWEEPER_RUNNING.clone()))
        .unwrap();

    // Core metrics (orchestrator, quota, sweeper)
    for metric in stemsplit_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the state of the world at
/// scrape time rather than the last event.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    SWEEPER_RUNNING.set(if state.sweeper_runner().is_running() {
        1
    } else {
        0
    });

    if let Ok(dirs) = state.store().list_session_dirs().await {
        SESSIONS_ON_DISK.set(dirs.len() as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/session/550e8400-e29b-41d4-a716-446655440000/preview";
        assert_eq!(normalize_path(path), "/api/v1/session/{id}/preview");
    }

    #[test]
    fn test_normalize_path_stem_route() {
        let path = "/api/v1/session/550e8400-e29b-41d4-a716-446655440000/stem/vocals";
        assert_eq!(normalize_path(path), "/api/v1/session/{id}/stem/vocals");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/things/12345";
        assert_eq!(normalize_path(path), "/api/v1/things/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("stemsplit_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch all metrics to ensure they appear in output
        // (Prometheus only outputs metrics that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        AUTH_FAILURES_TOTAL
            .with_label_values(&["not_authenticated"])
            .inc();
        SESSIONS_ON_DISK.set(0);
        SWEEPER_RUNNING.set(0);

        let output = encode_metrics();

        assert!(output.contains("stemsplit_http_request_duration_seconds"));
        assert!(output.contains("stemsplit_http_requests_total"));
        assert!(output.contains("stemsplit_http_requests_in_flight"));
        assert!(output.contains("stemsplit_auth_failures_total"));
        assert!(output.contains("stemsplit_sessions_on_disk"));
        assert!(output.contains("stemsplit_sweeper_running"));
    }
}
