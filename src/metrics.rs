//! Prometheus metrics for the broker.
//!
//! Metric names are stable contracts:
//! `cafelog_requests_total{type}`, `cafelog_errors_total{code}`, and
//! `cafelog_tcp_connections_current`. Counters and the gauge are safe to
//! update from any task without external synchronization.

use prometheus::{CounterVec, IntGauge, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "cafelog";

/// Counter and gauge registry consumed by the server and handlers.
pub struct BrokerMetrics {
    registry: Registry,
    requests_total: CounterVec,
    errors_total: CounterVec,
    connections_current: IntGauge,
}

impl BrokerMetrics {
    /// Create and register the broker metric set on a private registry.
    ///
    /// # Panics
    ///
    /// Panics if metric registration fails, which cannot happen with the
    /// fixed names below.
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total protocol requests by type").namespace(NAMESPACE),
            &["type"],
        )
        .expect("metric creation should succeed");

        let errors_total = CounterVec::new(
            Opts::new("errors_total", "Total broker logical errors by code").namespace(NAMESPACE),
            &["code"],
        )
        .expect("metric creation should succeed");

        let connections_current = IntGauge::with_opts(
            Opts::new(
                "tcp_connections_current",
                "Current number of active TCP connections",
            )
            .namespace(NAMESPACE),
        )
        .expect("metric creation should succeed");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("metric registration should succeed");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("metric registration should succeed");
        registry
            .register(Box::new(connections_current.clone()))
            .expect("metric registration should succeed");

        Self {
            registry,
            requests_total,
            errors_total,
            connections_current,
        }
    }

    /// Count one dispatched request of the given type label.
    pub fn record_request(&self, request_type: &str) {
        self.requests_total
            .with_label_values(&[request_type])
            .inc();
    }

    /// Count one error response with the given wire code.
    pub fn record_error(&self, code: &str) {
        self.errors_total.with_label_values(&[code]).inc();
    }

    pub fn connection_opened(&self) {
        self.connections_current.inc();
    }

    pub fn connection_closed(&self) {
        self.connections_current.dec();
    }

    pub fn active_connections(&self) -> i64 {
        self.connections_current.get()
    }

    /// Encode the registry in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = String::new();
        encoder.encode_utf8(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

impl Default for BrokerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
