//! Prometheus metrics for the provisioner.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides a middleware for HTTP RED metrics
//! and per-operation outcome counters, and exposes the `/metrics` handler.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

use crate::errors::ProvisionerError;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "provisioner_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "provisioner_http_request_duration_seconds";

/// Total lifecycle operations (counter). Labels: operation, code.
pub const OPERATIONS_TOTAL: &str = "provisioner_operations_total";

// -- Global recorder installation ---------------------------------------------

/// Handle to the Prometheus recorder; `None` if installation failed.
static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder.  Idempotent, so tests may call it
/// repeatedly.  Returns `None` if another recorder already owns the slot.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .as_ref()
}

/// Register metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(OPERATIONS_TOTAL, "Total lifecycle operations by outcome");
}

/// Count one lifecycle operation outcome.
pub fn record_operation<T>(operation: &'static str, result: &Result<T, ProvisionerError>) {
    let code = match result {
        Ok(_) => "ok",
        Err(e) => e.code().as_str(),
    };
    counter!(OPERATIONS_TOTAL, "operation" => operation, "code" => code).increment(1);
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation.  Must be the outermost
/// layer so it captures the full request lifecycle.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path, "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Known route paths.  Anything else is labelled `other` to keep label
/// cardinality bounded.
const KNOWN_PATHS: &[&str] = &[
    "/health",
    "/openapi.json",
    "/v1/provisioner/info",
    "/v1/buckets/create",
    "/v1/buckets/delete",
    "/v1/buckets/grant",
    "/v1/buckets/revoke",
];

fn normalize_path(path: &str) -> &'static str {
    KNOWN_PATHS
        .iter()
        .find(|known| **known == path)
        .copied()
        .unwrap_or("other")
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get().and_then(Option::as_ref) {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics disabled").into_response(),
    }
}

// -- Tests --------------------------------------------------------------------
