//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (first cycle immediately)
//!     → Probe each backend concurrently
//!     → Overwrite its flag in state.rs
//!
//! Registry (state.rs):
//!     address → healthy
//!     Written by the monitor only, read by the dispatcher
//! ```
//!
//! # Design Decisions
//! - A probe is healthy only on HTTP 200; anything else, including timeouts, is unhealthy
//! - Probe failures are logged and recorded, never propagated
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::{HealthMonitor, ProbeOutcome};
pub use state::HealthRegistry;
