//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ytp_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ytp_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ytp_http_requests_in_flight";

    // Upstream metrics
    pub const UPSTREAM_FAILURES_TOTAL: &str = "ytp_upstream_failures_total";
    pub const PLAYLIST_ENTRIES_SKIPPED_TOTAL: &str = "ytp_playlist_entries_skipped_total";

    // Streaming metrics
    pub const STREAMS_STARTED_TOTAL: &str = "ytp_streams_started_total";
    pub const STREAM_BYTES_TOTAL: &str = "ytp_stream_bytes_total";
    pub const STREAM_ERRORS_TOTAL: &str = "ytp_stream_errors_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ytp_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an upstream failure with its classified message.
pub fn record_upstream_failure(operation: &str, message: &str) {
    let labels = [
        ("operation", operation.to_string()),
        ("message", message.to_string()),
    ];
    counter!(names::UPSTREAM_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a playlist entry that could not be mapped.
pub fn record_playlist_entry_skipped() {
    counter!(names::PLAYLIST_ENTRIES_SKIPPED_TOTAL).increment(1);
}

/// Record a media stream handed to a client.
pub fn record_stream_started(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::STREAMS_STARTED_TOTAL, &labels).increment(1);
}

/// Record bytes forwarded to a client.
pub fn record_stream_bytes(kind: &str, bytes: u64) {
    let labels = [("kind", kind.to_string())];
    counter!(names::STREAM_BYTES_TOTAL, &labels).increment(bytes);
}

/// Record a stream that failed after headers were sent.
pub fn record_stream_error(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::STREAM_ERRORS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
///
/// Paths are labelled by their route template so arbitrary request paths
/// cannot grow label cardinality.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
