//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Respect RUST_LOG over the configured default directives
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Initialization is idempotent so test harnesses can call it freely

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize logging with the given default filter directives.
///
/// `RUST_LOG` wins when set. Calling this twice is harmless; the second
/// call is a no-op.
pub fn init(default_directives: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
