//! Read-only admin API.
//!
//! Exposes the engine's view of the backend pool. Nothing here mutates the
//! health registry; the health monitor stays its only writer.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{get_backends, get_status};
use crate::engine::EngineContext;

#[derive(Clone)]
pub struct AdminState {
    pub context: Arc<EngineContext>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(context: Arc<EngineContext>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            context,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
