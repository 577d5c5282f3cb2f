//! Round-robin HTTP load balancer with active health checks.

pub mod admin;
pub mod config;
pub mod engine;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use engine::{Dispatcher, EngineContext};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
