//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the static, ordered list of configured backends
//! - Derive the eligible set against the health registry, keeping config order

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::health::state::HealthRegistry;
use crate::load_balancer::backend::Backend;

/// The configured backends, in configuration order.
#[derive(Debug, Default)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
}

impl BackendPool {
    /// Create a pool from configuration, skipping unparsable addresses.
    pub fn from_config(configs: &[BackendConfig]) -> Self {
        let mut backends = Vec::with_capacity(configs.len());
        for config in configs {
            match Backend::parse(&config.address) {
                Ok(backend) => backends.push(Arc::new(backend)),
                Err(e) => tracing::warn!(address = %config.address, error = %e, "Invalid backend address"),
            }
        }
        Self { backends }
    }

    pub fn new(backends: Vec<Backend>) -> Self {
        Self {
            backends: backends.into_iter().map(Arc::new).collect(),
        }
    }

    /// All configured backends (for health checking).
    pub fn all_backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Backends currently marked healthy, in configuration order.
    pub fn eligible(&self, registry: &HealthRegistry) -> Vec<Arc<Backend>> {
        self.backends
            .iter()
            .filter(|b| registry.is_healthy(b.address()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
