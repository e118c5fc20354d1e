//! Metrics collection and export for the relay.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const SESSIONS_TOTAL: &str = "slugline_sessions_total";
    pub const SESSIONS_ACTIVE: &str = "slugline_sessions_active";
    pub const ROOMS_ACTIVE: &str = "slugline_rooms_active";
    pub const DELTAS_TOTAL: &str = "slugline_deltas_total";
    pub const DELTA_BYTES: &str = "slugline_delta_bytes";
    pub const FRAME_LATENCY_SECONDS: &str = "slugline_frame_latency_seconds";
    pub const ERRORS_TOTAL: &str = "slugline_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::SESSIONS_TOTAL,
        "Total number of sessions since relay start"
    );
    metrics::describe_gauge!(names::SESSIONS_ACTIVE, "Current number of live sessions");
    metrics::describe_gauge!(names::ROOMS_ACTIVE, "Current number of live rooms");
    metrics::describe_counter!(names::DELTAS_TOTAL, "Total number of deltas relayed");
    metrics::describe_counter!(names::DELTA_BYTES, "Total bytes of deltas relayed");
    metrics::describe_histogram!(
        names::FRAME_LATENCY_SECONDS,
        "Frame processing latency in seconds"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new session.
pub fn record_session() {
    counter!(names::SESSIONS_TOTAL).increment(1);
    gauge!(names::SESSIONS_ACTIVE).increment(1.0);
}

/// Record a session ending.
pub fn record_session_end() {
    gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a relayed delta.
pub fn record_delta(kind: &'static str, bytes: usize) {
    counter!(names::DELTAS_TOTAL, "kind" => kind).increment(1);
    counter!(names::DELTA_BYTES, "kind" => kind).increment(bytes as u64);
}

/// Record frame processing latency.
pub fn record_latency(seconds: f64) {
    histogram!(names::FRAME_LATENCY_SECONDS).record(seconds);
}

/// Update the active room count.
pub fn set_active_rooms(count: usize) {
    gauge!(names::ROOMS_ACTIVE).set(count as f64);
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Metrics guard that records the session end on drop.
pub struct SessionMetricsGuard;

impl SessionMetricsGuard {
    /// Create a new guard, recording a session.
    #[must_use]
    pub fn new() -> Self {
        record_session();
        Self
    }
}

impl Default for SessionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionMetricsGuard {
    fn drop(&mut self) {
        record_session_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_guard() {
        // Just test that it doesn't panic
        let _guard = SessionMetricsGuard::new();
    }
}
