//! Backend health registry.
//!
//! # Semantics
//! - One boolean per configured backend address
//! - An absent entry reads as unhealthy, never as routable
//! - Each probe overwrites the previous verdict; there is no hysteresis
//!
//! # Concurrency
//! Backed by a sharded concurrent map. Reads and writes of a single entry are
//! atomic; no snapshot consistency is offered across entries.

use dashmap::DashMap;

use crate::load_balancer::backend::Backend;

/// Concurrent map from backend address to its current health flag.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    entries: DashMap<String, bool>,
}

impl HealthRegistry {
    /// Create a registry with an entry for every backend, all set to `initial`.
    pub fn seeded<'a, I>(backends: I, initial: bool) -> Self
    where
        I: IntoIterator<Item = &'a Backend>,
    {
        let entries = DashMap::new();
        for backend in backends {
            entries.insert(backend.address().to_string(), initial);
        }
        Self { entries }
    }

    /// Whether the backend is currently eligible for traffic.
    pub fn is_healthy(&self, address: &str) -> bool {
        self.entries.get(address).map(|flag| *flag).unwrap_or(false)
    }

    /// Overwrite the flag for `address`, returning the previous value if any.
    pub fn record(&self, address: &str, healthy: bool) -> Option<bool> {
        self.entries.insert(address.to_string(), healthy)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn absent_entry_is_unhealthy() {
        let registry = HealthRegistry::default();
        assert!(!registry.is_healthy("http://nowhere:1"));
    }

    #[test]
    fn seeded_registry_has_one_entry_per_backend() {
        let backends = vec![
            Backend::parse("http://10.0.0.1:1").unwrap(),
            Backend::parse("http://10.0.0.2:1").unwrap(),
        ];
        let registry = HealthRegistry::seeded(&backends, false);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_healthy("http://10.0.0.1:1"));
    }

    #[test]
    fn record_overwrites_and_returns_previous() {
        let registry = HealthRegistry::default();
        assert_eq!(registry.record("a", true), None);
        assert!(registry.is_healthy("a"));
        assert_eq!(registry.record("a", false), Some(true));
        assert!(!registry.is_healthy("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_writes_and_reads_do_not_corrupt_entries() {
        let registry = Arc::new(HealthRegistry::default());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for n in 0..1_000 {
                    registry.record("shared", (i + n) % 2 == 0);
                    let _ = registry.is_healthy("shared");
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 1);
    }
}
