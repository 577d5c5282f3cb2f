//! Request-dispatch engine.
//!
//! # Data Flow
//! ```text
//! Inbound request (http/server.rs)
//!     → dispatcher.rs
//!         → context.rs: eligible set = pool ∩ healthy (config order)
//!         → empty?        → 503, no backend contacted
//!         → cursor += 1   → eligible[cursor mod len]
//!         → Upstream::send (one call, no retry)
//!         → relay status/headers/body, or 500 on failure
//!
//! HealthMonitor (health/active.rs)
//!     → writes context.rs registry on its own schedule
//! ```
//!
//! # Design Decisions
//! - All shared state lives in one injected [`EngineContext`]; there are no
//!   process-wide statics, so independent engines can coexist
//! - The registry and the cursor are each independently consistent; no
//!   cross-resource locking

pub mod context;
pub mod dispatcher;

pub use context::EngineContext;
pub use dispatcher::{Dispatcher, ProxyError, Relayed};
