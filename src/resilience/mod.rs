//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend (probe or forward):
//!     → timeouts.rs (enforce the call's deadline)
//!     → elapsed deadline surfaces as an upstream timeout
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed forward is reported, not replayed on another backend

pub mod timeouts;

pub use timeouts::{with_deadline, Elapsed};
