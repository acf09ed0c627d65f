//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the sieve server:
//! - HTTP request metrics (latency, counts, errors)
//! - WebSocket connection metrics
//! - Upload rejections
//! - Task and hub status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

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
            "sieve_http_request_duration_seconds",
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
        Opts::new("sieve_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sieve_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Uploads rejected before a task was started.
pub static UPLOADS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sieve_uploads_rejected_total", "Total rejected uploads"),
        &["reason"], // "extension", "empty", "too_large", "malformed"
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sieve_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sieve_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket frames sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sieve_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"], // "event", "ping"
    )
    .unwrap()
});

// =============================================================================
// Task Metrics (collected dynamically)
// =============================================================================

/// Tasks currently queued or running.
pub static TASKS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("sieve_tasks_active", "Number of active cleaning tasks").unwrap()
});

/// Cancelled tasks that have not reached a checkpoint yet.
pub static TASKS_CANCELLING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sieve_tasks_cancelling",
        "Number of cancelled tasks still winding down",
    )
    .unwrap()
});

/// Results held in memory.
pub static RESULTS_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("sieve_results_stored", "Number of stored task results").unwrap()
});

/// Tasks with a live subscriber.
pub static HUB_SUBSCRIBERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "sieve_hub_subscribers",
        "Number of tasks with a live progress subscriber",
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
        .register(Box::new(UPLOADS_REJECTED.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();

    // Tasks
    registry.register(Box::new(TASKS_ACTIVE.clone())).unwrap();
    registry
        .register(Box::new(TASKS_CANCELLING.clone()))
        .unwrap();
    registry.register(Box::new(RESULTS_STORED.clone())).unwrap();
    registry
        .register(Box::new(HUB_SUBSCRIBERS.clone()))
        .unwrap();

    // Core metrics (orchestrator, hub)
    for metric in sieve_core::metrics::all_metrics() {
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
/// This is called before encoding metrics to update gauges with current
/// values from the orchestrator and hub.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    TASKS_ACTIVE.set((status.queued + status.running) as i64);
    TASKS_CANCELLING.set(status.cancelling as i64);
    RESULTS_STORED.set(status.stored_results as i64);

    HUB_SUBSCRIBERS.set(state.hub().subscriber_count().await as i64);
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static TASK_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(tasks|ws)/[^/{]+").unwrap());

/// Normalize a path for metric labels (replace task ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = TASK_SEGMENT.replace_all(&result, "/$1/{id}");
    result.to_string()
}
