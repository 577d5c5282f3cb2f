use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub backends: usize,
    pub healthy_backends: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendStatus {
    pub address: String,
    pub healthy: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        backends: state.context.pool().len(),
        healthy_backends: state.context.eligible().len(),
    })
}

/// Health snapshot of every configured backend, in configuration order.
pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let registry = state.context.registry();
    let statuses = state
        .context
        .pool()
        .all_backends()
        .iter()
        .map(|b| BackendStatus {
            address: b.address().to_string(),
            healthy: registry.is_healthy(b.address()),
        })
        .collect();

    Json(statuses)
}
