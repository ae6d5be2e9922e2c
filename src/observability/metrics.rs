//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, scoring calls, decisions)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): total requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): inbound latency by route
//! - `gateway_scoring_calls_total` (counter): outbound calls by outcome
//! - `gateway_scoring_duration_seconds` (histogram): outbound latency
//! - `gateway_decisions_total` (counter): allow/deny decisions by source
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are low-cardinality (route names, never paths of unmatched requests)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed inbound request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an outbound scoring call; `outcome` is `ok` or an error kind.
pub fn record_scoring_call(outcome: &'static str, start: Instant) {
    metrics::counter!("gateway_scoring_calls_total", "outcome" => outcome).increment(1);
    metrics::histogram!("gateway_scoring_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record an allow/deny decision.
///
/// `source` is `verdict` for scored requests and `failure_policy` when the
/// scoring service was unavailable.
pub fn record_decision(decision: &'static str, source: &'static str) {
    metrics::counter!(
        "gateway_decisions_total",
        "decision" => decision,
        "source" => source,
    )
    .increment(1);
}
