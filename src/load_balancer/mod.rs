//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (configured backends filtered by the health registry)
//!     → round_robin.rs (advance cursor, index into the eligible set)
//!     → backend.rs (build the outbound URI)
//! ```
//!
//! # Design Decisions
//! - The pool is static; only health flags change at runtime
//! - The eligible set keeps configuration order so rotation is deterministic
//! - Unhealthy backends are excluded before selection, never skipped during it

use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::BackendPool;
pub use round_robin::RoundRobin;

/// Selection strategy over an already filtered eligible set.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend, or `None` when `eligible` is empty.
    fn next_server(&self, eligible: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}
