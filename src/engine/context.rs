//! Shared engine state.

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::health::state::HealthRegistry;
use crate::load_balancer::{Backend, BackendPool, LoadBalancer, RoundRobin};

/// Everything the dispatcher and the health monitor share.
///
/// - `pool`: the static backend list
/// - `registry`: health flags, written by the monitor only
/// - `balancer`: the round-robin rotation cursor
#[derive(Debug)]
pub struct EngineContext {
    pool: BackendPool,
    registry: HealthRegistry,
    balancer: RoundRobin,
}

impl EngineContext {
    /// Create a context where every backend is unhealthy until first probed.
    pub fn new(pool: BackendPool) -> Self {
        let registry = HealthRegistry::seeded(pool.all_backends().iter().map(Arc::as_ref), false);
        Self {
            pool,
            registry,
            balancer: RoundRobin::new(),
        }
    }

    /// Build from configuration.
    ///
    /// With active health checks disabled nothing would ever mark a backend
    /// healthy, so the whole pool starts (and stays) routable.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let pool = BackendPool::from_config(&config.backends);
        let initial = !config.health_check.enabled;
        if initial {
            tracing::warn!(
                backends = pool.len(),
                "Health checks disabled; treating every backend as healthy"
            );
        }
        let registry = HealthRegistry::seeded(pool.all_backends().iter().map(Arc::as_ref), initial);
        Self {
            pool,
            registry,
            balancer: RoundRobin::new(),
        }
    }

    /// Replace the rotation cursor with one starting at `start`.
    pub fn with_cursor(mut self, start: usize) -> Self {
        self.balancer = RoundRobin::starting_at(start);
        self
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    pub fn balancer(&self) -> &RoundRobin {
        &self.balancer
    }

    /// Configured backends currently marked healthy, in configuration order.
    pub fn eligible(&self) -> Vec<Arc<Backend>> {
        self.pool.eligible(&self.registry)
    }

    /// Pick the next backend. Returns `None`, leaving the cursor untouched,
    /// when no backend is healthy.
    pub fn select(&self) -> Option<Arc<Backend>> {
        let eligible = self.eligible();
        self.balancer.next_server(&eligible)
    }
}
