//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay backend responses to the client unchanged (status, headers, body)
//! - Map engine failures to the fixed client-facing responses
//!
//! # Design Decisions
//! - Bodies arrive fully read from the upstream client, so a relayed status is never followed by a failed body
//! - Hop-by-hop headers stripped automatically
//! - Every failure still produces a complete response, including handler panics

use std::any::Any;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::engine::ProxyError;
use crate::http::request::strip_hop_by_hop;

/// Body sent when the eligible set is empty.
pub const NO_HEALTHY_BACKENDS_BODY: &str = "Service Unavailable - No healthy backends!";

/// Body sent when forwarding fails.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Pass a backend response through to the client.
pub fn relay(response: Response<Body>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, body)
}

pub fn no_healthy_backends() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, NO_HEALTHY_BACKENDS_BODY).into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::NoHealthyBackends => no_healthy_backends(),
            ProxyError::InvalidRequest { .. } | ProxyError::Upstream { .. } => internal_error(),
        }
    }
}

/// Convert a handler panic into the generic error response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");
    internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn proxy_errors_map_to_fixed_statuses() {
        assert_eq!(
            ProxyError::NoHealthyBackends.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let err = ProxyError::Upstream {
            backend: "http://a:1".into(),
            source: crate::http::client::UpstreamError::Timeout(std::time::Duration::from_secs(1)),
        };
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn relay_keeps_status_and_end_to_end_headers() {
        let upstream = Response::builder()
            .status(StatusCode::CREATED)
            .header(header::CONNECTION, "close")
            .header(header::ETAG, "\"v1\"")
            .body(Body::from("made"))
            .unwrap();

        let relayed = relay(upstream);
        assert_eq!(relayed.status(), StatusCode::CREATED);
        assert!(relayed.headers().get(header::CONNECTION).is_none());
        assert_eq!(relayed.headers().get(header::ETAG).unwrap(), "\"v1\"");
    }

    #[test]
    fn panic_response_is_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
