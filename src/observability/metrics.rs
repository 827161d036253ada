//! Metrics collection and exposition.
//!
//! # Metrics
//! - `layout_requests_total` (counter): requests by method and status
//! - `layout_request_duration_seconds` (histogram): time to response headers
//! - `layout_render_errors_total` (counter): isolated node failures by node
//! - `layout_redirects_total` (counter): redirect responses
//! - `layout_config_reloads_total` (counter): reloads by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter
//! - The Prometheus exporter serves its own listener, apart from the
//!   layout server

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    ::metrics::counter!("layout_requests_total", &labels).increment(1);
    ::metrics::histogram!("layout_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_render_error(node: &str) {
    ::metrics::counter!("layout_render_errors_total", "node" => node.to_string()).increment(1);
}

pub fn record_redirect() {
    ::metrics::counter!("layout_redirects_total").increment(1);
}

pub fn record_config_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("layout_config_reloads_total", "outcome" => outcome).increment(1);
}
