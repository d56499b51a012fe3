//! Prometheus metrics endpoint
//!
//! Exposes generation metrics in Prometheus format for monitoring.

use std::time::Duration;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;

    metrics::describe_counter!(
        "lumen_requests_total",
        "Total number of generation requests by kind, channel and outcome"
    );
    metrics::describe_histogram!(
        "lumen_request_duration_seconds",
        "Generation duration in seconds, including retries and rotation"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record one finished generation
///
/// `status` is `ok` or the error code.
pub fn record_request(kind: &'static str, channel: &str, status: &str, duration: Duration) {
    metrics::counter!(
        "lumen_requests_total",
        "kind" => kind,
        "channel" => channel.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "lumen_request_duration_seconds",
        "kind" => kind,
        "channel" => channel.to_string()
    )
    .record(duration.as_secs_f64());
}
