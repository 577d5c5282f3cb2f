//! Per-request dispatch.
//!
//! # States
//! ```text
//! RECEIVED → SELECTING → NO_BACKEND_AVAILABLE          (503)
//!                      → FORWARDING → RELAYED          (backend status)
//!                                   → BACKEND_ERROR    (500)
//! ```
//! Every state on the right is terminal and yields exactly one response.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::engine::EngineContext;
use crate::http::client::{Upstream, UpstreamError};
use crate::http::request::{prepare_forward, request_id};
use crate::http::response::relay;
use crate::load_balancer::Backend;
use crate::observability::metrics;

/// Why a request did not produce a relayed backend response.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The eligible set was empty; no backend was contacted.
    #[error("no healthy backends")]
    NoHealthyBackends,
    /// The outbound request could not be constructed.
    #[error("failed to build request for {backend}: {source}")]
    InvalidRequest {
        backend: String,
        #[source]
        source: axum::http::Error,
    },
    /// The selected backend could not be reached or did not answer in time.
    #[error("backend {backend} failed: {source}")]
    Upstream {
        backend: String,
        #[source]
        source: UpstreamError,
    },
}

impl ProxyError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackends => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::InvalidRequest { .. } | ProxyError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The selected backend, if selection got that far.
    pub fn backend(&self) -> Option<&str> {
        match self {
            ProxyError::NoHealthyBackends => None,
            ProxyError::InvalidRequest { backend, .. } | ProxyError::Upstream { backend, .. } => {
                Some(backend.as_str())
            }
        }
    }
}

/// A backend response ready to be relayed.
#[derive(Debug)]
pub struct Relayed {
    pub backend: Arc<Backend>,
    pub response: Response<Body>,
}

/// Selects a healthy backend for each request and proxies to it.
#[derive(Clone)]
pub struct Dispatcher {
    context: Arc<EngineContext>,
    upstream: Arc<dyn Upstream>,
}

impl Dispatcher {
    pub fn new(context: Arc<EngineContext>, upstream: Arc<dyn Upstream>) -> Self {
        Self { context, upstream }
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.context
    }

    /// Handle one inbound request. Always produces a response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let request_id = request_id(&request).to_string();

        match self.forward(request).await {
            Ok(Relayed { backend, response }) => {
                let status = response.status();
                tracing::debug!(
                    request_id = %request_id,
                    backend = %backend,
                    status = %status,
                    "Relaying backend response"
                );
                metrics::record_request(method.as_str(), status.as_u16(), backend.address(), start);
                relay(response)
            }
            Err(err) => {
                match &err {
                    ProxyError::NoHealthyBackends => {
                        tracing::warn!(request_id = %request_id, "No healthy backends");
                    }
                    ProxyError::InvalidRequest { backend, source } => {
                        tracing::error!(request_id = %request_id, backend = %backend, error = %source, "Failed to build upstream request");
                    }
                    ProxyError::Upstream { backend, source } => {
                        tracing::error!(request_id = %request_id, backend = %backend, error = %source, "Upstream error");
                    }
                }
                metrics::record_request(
                    method.as_str(),
                    err.status().as_u16(),
                    err.backend().unwrap_or("none"),
                    start,
                );
                err.into_response()
            }
        }
    }

    /// Select, forward once, and return the backend's response.
    ///
    /// Failures are never retried against another backend.
    pub async fn forward(&self, request: Request<Body>) -> Result<Relayed, ProxyError> {
        let backend = self.context.select().ok_or(ProxyError::NoHealthyBackends)?;

        tracing::debug!(
            backend = %backend,
            method = %request.method(),
            path = %request.uri().path(),
            "Routing request"
        );

        let outbound = prepare_forward(&backend, request).map_err(|source| ProxyError::InvalidRequest {
            backend: backend.address().to_string(),
            source,
        })?;

        let response = self
            .upstream
            .send(outbound)
            .await
            .map_err(|source| ProxyError::Upstream {
                backend: backend.address().to_string(),
                source,
            })?;

        Ok(Relayed { backend, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::stub::StubUpstream;
    use crate::load_balancer::BackendPool;
    use axum::http::Method;

    const A: &str = "http://10.0.0.1:8081";
    const B: &str = "http://10.0.0.2:8082";
    const C: &str = "http://10.0.0.3:8083";

    fn context(healthy: &[&str]) -> EngineContext {
        let pool = BackendPool::new(
            [A, B, C].iter().map(|a| Backend::parse(a).unwrap()).collect(),
        );
        let context = EngineContext::new(pool);
        for address in healthy {
            context.registry().record(address, true);
        }
        context
    }

    fn dispatcher(context: EngineContext, stub: Arc<StubUpstream>) -> Dispatcher {
        Dispatcher::new(Arc::new(context), stub)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn three_healthy_backends_rotate_in_order() {
        let stub = Arc::new(StubUpstream::new());
        let dispatcher = dispatcher(context(&[A, B, C]), stub.clone());

        for _ in 0..4 {
            let response = dispatcher.handle(get("/")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(
            stub.authorities(),
            ["10.0.0.1:8081", "10.0.0.2:8082", "10.0.0.3:8083", "10.0.0.1:8081"]
        );
    }

    #[tokio::test]
    async fn cursor_five_with_b_unhealthy_routes_to_c() {
        let stub = Arc::new(StubUpstream::new());
        let dispatcher = dispatcher(context(&[A, C]).with_cursor(5), stub.clone());

        dispatcher.handle(get("/")).await;
        assert_eq!(stub.authorities(), ["10.0.0.3:8083"]);
    }

    #[tokio::test]
    async fn no_healthy_backend_returns_503_without_outbound_calls() {
        let stub = Arc::new(StubUpstream::new());
        let dispatcher = dispatcher(context(&[]), stub.clone());

        let response = dispatcher.handle(get("/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "Service Unavailable - No healthy backends!");
        assert_eq!(stub.call_count(), 0);
        assert_eq!(dispatcher.context().balancer().cursor(), 0);
    }

    #[tokio::test]
    async fn backend_failure_returns_500_without_fallback() {
        let stub = Arc::new(StubUpstream::new().failing("10.0.0.1:8081"));
        let dispatcher = dispatcher(context(&[A, B, C]), stub.clone());

        let response = dispatcher.handle(get("/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
        assert_eq!(stub.authorities(), ["10.0.0.1:8081"], "no second backend tried");

        let next = dispatcher.handle(get("/")).await;
        assert_eq!(next.status(), StatusCode::OK);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn backend_status_and_body_are_relayed_verbatim() {
        let stub = Arc::new(StubUpstream::new().status("10.0.0.2:8082", StatusCode::IM_A_TEAPOT));
        let dispatcher = dispatcher(context(&[B]), stub.clone());

        let response = dispatcher.handle(get("/brew")).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers().get("x-backend").unwrap(), "10.0.0.2:8082");
        assert_eq!(body_text(response).await, "10.0.0.2:8082 GET ");
    }

    #[tokio::test]
    async fn method_path_and_body_are_forwarded() {
        let stub = Arc::new(StubUpstream::new());
        let dispatcher = dispatcher(context(&[A]), stub.clone());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/orders?id=9")
            .header("host", "lb.example")
            .header("x-custom", "kept")
            .body(Body::from("payload"))
            .unwrap();
        let response = dispatcher.handle(request).await;

        assert_eq!(body_text(response).await, "10.0.0.1:8081 POST payload");
        let call = &stub.calls()[0];
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.uri.to_string(), "http://10.0.0.1:8081/orders?id=9");
        assert_eq!(call.headers.get("x-custom").unwrap(), "kept");
        assert!(call.headers.get("host").is_none());
    }

    #[tokio::test]
    async fn forward_reports_selected_backend_on_error() {
        let stub = Arc::new(StubUpstream::new().failing("10.0.0.2:8082"));
        let dispatcher = dispatcher(context(&[B]), stub);

        let err = dispatcher.forward(get("/")).await.unwrap_err();
        assert_eq!(err.backend(), Some(B));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn concurrent_requests_each_take_one_cursor_value() {
        let stub = Arc::new(StubUpstream::new());
        let dispatcher = dispatcher(context(&[A, B, C]), stub.clone());

        let tasks: Vec<_> = (0..30)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.handle(get("/")).await.status() })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        let authorities = stub.authorities();
        for authority in ["10.0.0.1:8081", "10.0.0.2:8082", "10.0.0.3:8083"] {
            assert_eq!(authorities.iter().filter(|a| *a == authority).count(), 10);
        }
        assert_eq!(dispatcher.context().balancer().cursor(), 30);
    }
}
