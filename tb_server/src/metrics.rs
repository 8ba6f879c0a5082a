//! Prometheus metrics for monitoring bracket server health and activity.
//!
//! This module provides metrics collection and export via the `/metrics` endpoint.
//! Metrics are exposed in Prometheus text format for scraping by monitoring systems.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **Bracket Metrics**: Brackets generated and finished, results recorded,
//!   matches resolved automatically
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tb_server::metrics;
//! use std::net::SocketAddr;
//!
//! // Initialize metrics exporter
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! // Record HTTP request
//! metrics::http_requests_total("POST", "/api/v1/brackets/{bracket_id}/matches/{match_id}/result", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Bracket Metrics
// ============================================================================

/// Increment brackets generated counter.
pub fn brackets_generated_total() {
    metrics::counter!("brackets_generated_total").increment(1);
}

/// Increment match results counter.
///
/// `outcome` is `advanced`, `finished` or `rejected`.
pub fn match_results_total(outcome: &'static str) {
    metrics::counter!("match_results_total", "outcome" => outcome).increment(1);
}

/// Add matches resolved without being played.
pub fn auto_resolved_matches_total(count: usize) {
    metrics::counter!("auto_resolved_matches_total").increment(count as u64);
}

/// Increment finished brackets counter.
pub fn brackets_finished_total() {
    metrics::counter!("brackets_finished_total").increment(1);
}
