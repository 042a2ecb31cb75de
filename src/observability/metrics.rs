//! Metrics collection and exposition.
//!
//! # Metrics
//! - `todo_db_connect_attempts_total` (counter): connection attempts by outcome
//! - `todo_proxy_requests_total` (counter): proxied requests by method, status
//! - `todo_proxy_request_duration_seconds` (histogram): proxy round-trip latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a database connection attempt (`success` or `failure`).
pub fn record_db_connect(outcome: &'static str) {
    metrics::counter!("todo_db_connect_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a proxied request and its latency.
pub fn record_proxy_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "todo_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("todo_proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
