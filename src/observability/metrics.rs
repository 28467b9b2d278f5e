//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests entering the pipeline
//! - `gateway_tls_redirects_total` (counter): plaintext requests redirected
//! - `gateway_api_rejections_total` (counter): API gate rejections by reason
//! - `gateway_proxy_requests_total` (counter): forwarded requests by upstream status
//! - `gateway_proxy_errors_total` (counter): proxy failures answered by the guard
//! - `gateway_failures_total` (counter): failures rendered by the error stage
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! metrics-disabled deployments pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request() {
    metrics::counter!("gateway_requests_total").increment(1);
}

pub fn record_tls_redirect() {
    metrics::counter!("gateway_tls_redirects_total").increment(1);
}

pub fn record_api_rejection(reason: &'static str) {
    metrics::counter!("gateway_api_rejections_total", "reason" => reason).increment(1);
}

pub fn record_proxy_response(status: u16) {
    metrics::counter!("gateway_proxy_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_proxy_error() {
    metrics::counter!("gateway_proxy_errors_total").increment(1);
}

pub fn record_failure(status: u16, kind: &'static str) {
    metrics::counter!(
        "gateway_failures_total",
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);
}
