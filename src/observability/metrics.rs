//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cors_proxy_requests_total` (counter): handled requests by outcome
//! - `cors_proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `cors_proxy_upstream_duration_seconds` (histogram): time to upstream response headers
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a request ended, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Help,
    Malformed,
    Relayed,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Help => "help",
            Outcome::Malformed => "malformed",
            Outcome::Relayed => "relayed",
            Outcome::Error => "error",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: Outcome, start: Instant) {
    ::metrics::counter!("cors_proxy_requests_total", "outcome" => outcome.as_str()).increment(1);
    ::metrics::histogram!("cors_proxy_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(start: Instant) {
    ::metrics::histogram!("cors_proxy_upstream_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
