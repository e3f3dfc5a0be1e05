//! Metrics instrumentation for basketi-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `basketi_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `component`: engine, proxy, persistence
//! - `operation`: mutate, refresh, delete, fetch, install, activate
//! - `status`: success, error, stale, skipped, hit, miss

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record an operation outcome.
pub fn record_operation(component: &str, operation: &str, status: &str) {
    counter!(
        "basketi_operations_total",
        "component" => component.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(component: &str, operation: &str, duration: Duration) {
    histogram!(
        "basketi_operation_seconds",
        "component" => component.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a response discarded because its generation was superseded.
pub fn record_stale_generation(operation: &str) {
    counter!(
        "basketi_stale_generation_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a cache-proxy interception outcome per strategy.
pub fn record_cache(strategy: &str, outcome: &str) {
    counter!(
        "basketi_cache_requests_total",
        "strategy" => strategy.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Set current snapshot item count.
pub fn set_snapshot_items(count: usize) {
    gauge!("basketi_snapshot_items").set(count as f64);
}
