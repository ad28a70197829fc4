// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for typesense-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `typesense_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `component`: schema, client, sync
//! - `operation`: build, create, retrieve, update
//! - `status`: success, error, unchanged

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a synchronizer call outcome
pub fn record_sync_operation(operation: &str, status: &str) {
    counter!(
        "typesense_sync_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record latency of a component operation
pub fn record_latency(component: &str, operation: &str, duration: Duration) {
    histogram!(
        "typesense_sync_operation_seconds",
        "component" => component.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a rejected schema derivation
pub fn record_schema_error(kind: &str) {
    counter!(
        "typesense_sync_schema_errors_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record number of fields in a derived schema
pub fn record_schema_fields(count: usize) {
    histogram!("typesense_sync_schema_fields").record(count as f64);
}

/// Record field counts of a computed diff
pub fn record_diff(added: usize, removed: usize, changed: usize) {
    counter!("typesense_sync_fields_added_total").increment(added as u64);
    counter!("typesense_sync_fields_removed_total").increment(removed as u64);
    counter!("typesense_sync_fields_changed_total").increment(changed as u64);
    histogram!("typesense_sync_diff_fields").record((added + removed + changed) as f64);
}

/// Record a request to the search engine
pub fn record_client_request(operation: &str, status: &str) {
    counter!(
        "typesense_sync_client_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Set number of collections known to a registry
pub fn set_registered_collections(count: usize) {
    gauge!("typesense_sync_registered_collections").set(count as f64);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    component: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(component: &'static str, operation: &'static str) -> Self {
        Self {
            component,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.component, self.operation, self.start.elapsed());
    }
}

/// Convenience macro for timing operations
#[macro_export]
macro_rules! time_operation {
    ($component:expr, $op:expr) => {
        $crate::metrics::LatencyTimer::new($component, $op)
    };
}
