//! Prometheus metrics for Hermes.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `hermes_requests_total` | Counter | `route`, `status` |
//! | `hermes_request_duration_seconds` | Histogram | `route` |
//! | `hermes_request_validation_failures_total` | Counter | `location` |
//! | `hermes_response_validation_failures_total` | Counter | `route`, `status` |
//! | `hermes_hook_short_circuits_total` | Counter | `phase` |
//!
//! The recording functions are cheap no-ops until a recorder is installed,
//! so the dispatcher calls them unconditionally.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const REQUESTS_TOTAL: &str = "hermes_requests_total";
const REQUEST_DURATION: &str = "hermes_request_duration_seconds";
const REQUEST_VALIDATION_FAILURES: &str = "hermes_request_validation_failures_total";
const RESPONSE_VALIDATION_FAILURES: &str = "hermes_response_validation_failures_total";
const HOOK_SHORT_CIRCUITS: &str = "hermes_hook_short_circuits_total";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// Calling this more than once fails; use [`render_metrics`] to read the
/// installed recorder.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidBuckets`] for empty buckets and
/// [`TelemetryError::RecorderInstall`] if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::InvalidBuckets(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::RecorderInstall(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(REQUEST_DURATION, "Dispatch duration in seconds");
    describe_counter!(
        REQUEST_VALIDATION_FAILURES,
        "Requests rejected by schema validation, per failing location"
    );
    describe_counter!(
        RESPONSE_VALIDATION_FAILURES,
        "Handler responses that broke their declared schema"
    );
    describe_counter!(
        HOOK_SHORT_CIRCUITS,
        "Requests answered directly by a lifecycle hook"
    );
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Records a completed request.
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "route" => route.to_string()).record(duration.as_secs_f64());
}

/// Records one failing input location.
pub fn record_request_validation_failure(location: &'static str) {
    counter!(REQUEST_VALIDATION_FAILURES, "location" => location).increment(1);
}

/// Records a response that failed validation.
pub fn record_response_validation_failure(route: &str, status_code: u16) {
    counter!(
        RESPONSE_VALIDATION_FAILURES,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);
}

/// Records a hook that answered the request itself.
pub fn record_hook_short_circuit(phase: &'static str) {
    counter!(HOOK_SHORT_CIRCUITS, "phase" => phase).increment(1);
}
