//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parseable)
//! - Check the admin surface has credentials when enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the config
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// One semantic violation found in a configuration.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a valid socket address")]
    BindAddress(String),
    #[error("observability.metrics_address `{0}` is not a valid socket address")]
    MetricsAddress(String),
    #[error("observability.log_level `{0}` is not a valid filter directive")]
    LogLevel(String),
    #[error("limits.max_body_bytes must be greater than zero")]
    BodyLimitZero,
    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeoutZero,
    #[error("admin.api_key must be set when the admin surface is enabled")]
    AdminKeyMissing,
}

/// Check semantic constraints, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if tracing_subscriber::EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimitZero);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeoutZero);
    }
    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::AdminKeyMissing);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
