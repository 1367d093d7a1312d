//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (request counts, latency)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by procedure, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by procedure
//!
//! # Design Decisions
//! - Metric names live here and nowhere else
//! - Unmatched requests are labeled `unmatched` rather than dropped, so
//!   probe traffic and typo storms stay visible

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

/// Error installing the metrics exporter.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics address `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("failed to install Prometheus exporter: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(address: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = address.parse().map_err(|source| MetricsError::Address {
        address: address.to_string(),
        source,
    })?;
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_dispatch(procedure: &str, method: &str, status: u16, started: Instant) {
    counter!(
        "gateway_requests_total",
        "procedure" => procedure.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "procedure" => procedure.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}
