//! Outbound HTTP capability.
//!
//! # Responsibilities
//! - Send one request to one backend and hand back its response
//! - Enforce connect and total deadlines per call
//! - Read the whole response body before returning, so a stalled or
//!   truncated body is an upstream failure and not a broken relay
//!
//! The [`Upstream`] trait is the seam between the engine and the network:
//! the dispatcher and the health monitor only ever talk to it, so tests can
//! swap in a double that counts calls.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::resilience::with_deadline;

/// Error type for outbound calls.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    #[error("upstream request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read upstream body: {0}")]
    Body(#[source] axum::Error),
}

/// Something that can deliver a request to a backend.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError>;
}

/// Hyper-backed upstream client with fixed deadlines.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpUpstream {
    /// Create a client that gives up connecting after `connect_timeout` and
    /// on the whole exchange after `timeout`.
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(UpstreamError::Body)?;
            Ok::<_, UpstreamError>(Response::from_parts(parts, Body::from(bytes)))
        };

        with_deadline(self.timeout, exchange)
            .await
            .map_err(|elapsed| UpstreamError::Timeout(elapsed.0))?
    }
}
