//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check backend addresses are routable http URLs
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::backend::{Backend, BackendAddressError};

/// A single semantic problem in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,
    #[error(transparent)]
    InvalidBackend(#[from] BackendAddressError),
    #[error("backend `{0}` is configured more than once")]
    DuplicateBackend(String),
    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),
    #[error("listener.max_in_flight must be greater than zero")]
    ZeroInFlightLimit,
    #[error("health_check.interval_secs must be greater than zero")]
    ZeroHealthInterval,
    #[error("health_check.timeout_secs must be greater than zero")]
    ZeroHealthTimeout,
    #[error("timeouts.forward_secs must be greater than zero")]
    ZeroForwardTimeout,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match Backend::parse(&backend.address) {
            Ok(parsed) => {
                if !seen.insert(parsed.base_url().clone()) {
                    errors.push(ValidationError::DuplicateBackend(backend.address.clone()));
                }
            }
            Err(e) => errors.push(e.into()),
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::ZeroInFlightLimit);
    }
    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroHealthInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroHealthTimeout);
    }
    if config.timeouts.forward_secs == 0 {
        errors.push(ValidationError::ZeroForwardTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
