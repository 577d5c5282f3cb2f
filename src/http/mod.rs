//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, in-flight limit)
//!     → engine dispatcher (select backend)
//!     → request.rs (rebase URI, filter headers)
//!     → client.rs (send to backend with deadline)
//!     → response.rs (relay, or map failure to 503/500)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{HttpUpstream, Upstream, UpstreamError};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
