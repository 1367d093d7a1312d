//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch pipeline
//!     → logging.rs (structured events per request)
//!     → metrics.rs (dispatch counters and latency)
//!
//! logging → stdout, filtered by RUST_LOG or the configured directives
//! metrics → Prometheus exporter on its own listener
//! ```
//!
//! # Design Decisions
//! - The request ID appears in log lines and the response header alike
//! - Metric label sets stay small: procedure, method, status
//! - Recording a metric never fails and never blocks the request path

pub mod logging;
pub mod metrics;
