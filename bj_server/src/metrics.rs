//! Prometheus metrics for monitoring server health.
//!
//! Metrics are exported from a dedicated HTTP listener in Prometheus text
//! format, separate from the game API.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts by method, path, and status
//! - **WebSocket Metrics**: Connection counts and pushed notifications
//! - **Game Metrics**: Active sessions, games created/started, hits dealt

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter.
///
/// Sets up a scrape endpoint on `addr`; metrics are served at
/// `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Record an HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket notifications pushed counter.
pub fn websocket_notifications_sent() {
    metrics::counter!("websocket_notifications_sent").increment(1);
}

/// Set current live session count.
pub fn active_sessions(count: usize) {
    metrics::gauge!("active_sessions").set(count as f64);
}

/// Increment games created counter.
pub fn games_created_total() {
    metrics::counter!("games_created_total").increment(1);
}

/// Increment games started counter.
pub fn games_started_total() {
    metrics::counter!("games_started_total").increment(1);
}

/// Increment cards dealt via hit counter.
pub fn hits_total() {
    metrics::counter!("hits_total").increment(1);
}
