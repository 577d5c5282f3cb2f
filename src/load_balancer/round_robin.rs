//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector.
///
/// Owns the rotation cursor: a process-lifetime counter that every selection
/// advances exactly once with a single atomic `fetch_add`, so no two callers
/// ever observe the same raw value. The counter is unsigned and wraps on
/// overflow, so the computed index can never be negative.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cursor at a given value.
    pub fn starting_at(value: usize) -> Self {
        Self {
            counter: AtomicUsize::new(value),
        }
    }

    /// Current cursor value (the next value a selection will take).
    pub fn cursor(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }

    /// Advance the cursor and map it onto `len` slots.
    ///
    /// Returns `None` without touching the cursor when `len` is zero.
    pub fn next_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let raw = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(raw % len)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, eligible: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        self.next_index(eligible.len())
            .map(|index| eligible[index].clone())
    }
}
