// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// - Orders created, by kind
// - Status transitions, by target status
// - Failed requests, by operation and error kind
// - Order creation latency
//
// All metrics are registered with one Registry and scraped via /metrics.
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounterVec,
    pub status_transitions: IntCounterVec,
    pub request_failures: IntCounterVec,
    pub order_creation_duration: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounterVec::new(
            Opts::new("orders_created_total", "Total orders created"),
            &["kind"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Total order status transitions"),
            &["status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let request_failures = IntCounterVec::new(
            Opts::new("order_request_failures_total", "Total failed order requests"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(request_failures.clone()))?;

        let order_creation_duration = Histogram::with_opts(
            HistogramOpts::new("order_creation_duration_seconds", "Order creation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(order_creation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            request_failures,
            order_creation_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a failed request
    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.request_failures.with_label_values(&[operation, kind]).inc();
    }
}
