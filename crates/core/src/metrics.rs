//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tasks (starts, outcomes, durations, cancellations)
//! - Progress hub (published events, queue trims, delivery failures)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator - Task Metrics
// =============================================================================

/// Tasks started total.
pub static TASKS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("sieve_tasks_started_total", "Total cleaning tasks started").unwrap()
});

/// Tasks finished total by outcome.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sieve_tasks_finished_total", "Total cleaning tasks finished"),
        &["outcome"], // "succeeded", "failed", "cancelled"
    )
    .unwrap()
});

/// Task duration in seconds.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("sieve_task_duration_seconds", "Duration of cleaning tasks")
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Start requests rejected total by reason.
pub static TASKS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sieve_tasks_rejected_total", "Total rejected task starts"),
        &["reason"], // "already_active", "validation", "at_capacity"
    )
    .unwrap()
});

/// Results evicted after their TTL.
pub static RESULTS_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("sieve_results_reaped_total", "Total task results evicted").unwrap()
});

// =============================================================================
// Progress hub
// =============================================================================

/// Events accepted by the hub, by delivery path.
pub static HUB_EVENTS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sieve_hub_events_published_total", "Total progress events published"),
        &["delivery"], // "live", "queued"
    )
    .unwrap()
});

/// Replay queue overflows.
pub static HUB_QUEUE_TRIMS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sieve_hub_queue_trims_total",
        "Times a replay queue overflowed and was trimmed",
    )
    .unwrap()
});

/// Failed sends to a live subscriber.
pub static HUB_DELIVERY_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sieve_hub_delivery_failures_total",
        "Total failed deliveries to a live subscriber",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tasks
        Box::new(TASKS_STARTED.clone()),
        Box::new(TASKS_FINISHED.clone()),
        Box::new(TASK_DURATION.clone()),
        Box::new(TASKS_REJECTED.clone()),
        Box::new(RESULTS_REAPED.clone()),
        // Hub
        Box::new(HUB_EVENTS_PUBLISHED.clone()),
        Box::new(HUB_QUEUE_TRIMS.clone()),
        Box::new(HUB_DELIVERY_FAILURES.clone()),
    ]
}
