//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every configured backend
//! - Overwrite each backend's flag in the health registry with the verdict

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::engine::EngineContext;
use crate::http::client::{Upstream, UpstreamError};
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

const USER_AGENT: &str = "lb-proxy-health-check";

/// Result of probing one backend.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Backend answered `200 OK`.
    Healthy,
    /// Backend answered with any other status.
    UnexpectedStatus(StatusCode),
    /// The probe request could not be built.
    InvalidRequest(String),
    /// Connection failure, protocol error or timeout.
    Failed(UpstreamError),
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }

    fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Healthy => "healthy",
            ProbeOutcome::UnexpectedStatus(_) => "unexpected_status",
            ProbeOutcome::InvalidRequest(_) => "invalid_request",
            ProbeOutcome::Failed(UpstreamError::Timeout(_)) => "timeout",
            ProbeOutcome::Failed(UpstreamError::Body(_)) => "body_error",
            ProbeOutcome::Failed(_) => "connection_error",
        }
    }
}

/// Periodic prober; the only writer of the health registry.
pub struct HealthMonitor {
    context: Arc<EngineContext>,
    config: HealthCheckConfig,
    client: Arc<dyn Upstream>,
}

impl HealthMonitor {
    /// `client` should carry the probe timeout (see [`HealthCheckConfig::timeout_secs`]).
    pub fn new(
        context: Arc<EngineContext>,
        config: HealthCheckConfig,
        client: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            context,
            config,
            client,
        }
    }

    /// Run probe cycles until shutdown. The first cycle starts immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            backends = self.context.pool().len(),
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and record the verdicts.
    ///
    /// Probes run concurrently and independently; one failing probe never
    /// prevents the others from completing or being recorded.
    pub async fn check_all(&self) {
        tracing::debug!("Performing health checks");

        let probes = self
            .context
            .pool()
            .all_backends()
            .iter()
            .map(|backend| async move {
                let outcome = self.probe(backend).await;
                self.record(backend, &outcome);
            });

        join_all(probes).await;
    }

    /// Probe a single backend. Never fails; every problem becomes an outcome.
    pub async fn probe(&self, backend: &Backend) -> ProbeOutcome {
        let uri = match backend.probe_uri(&self.config.path) {
            Ok(uri) => uri,
            Err(e) => return ProbeOutcome::InvalidRequest(e.to_string()),
        };

        let request = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(request) => request,
            Err(e) => return ProbeOutcome::InvalidRequest(e.to_string()),
        };

        match self.client.send(request).await {
            Ok(response) if response.status() == StatusCode::OK => ProbeOutcome::Healthy,
            Ok(response) => ProbeOutcome::UnexpectedStatus(response.status()),
            Err(e) => ProbeOutcome::Failed(e),
        }
    }

    fn record(&self, backend: &Backend, outcome: &ProbeOutcome) {
        let healthy = outcome.is_healthy();
        let previous = self.context.registry().record(backend.address(), healthy);

        match outcome {
            ProbeOutcome::Healthy => {
                tracing::debug!(backend = %backend, "Backend is healthy");
            }
            ProbeOutcome::UnexpectedStatus(status) => {
                tracing::debug!(backend = %backend, status = %status, "Health check failed: non-200 status");
            }
            ProbeOutcome::InvalidRequest(error) => {
                tracing::error!(backend = %backend, error = %error, "Failed to build health check request");
            }
            ProbeOutcome::Failed(error) => {
                tracing::debug!(backend = %backend, error = %error, "Health check failed");
            }
        }

        if previous != Some(healthy) {
            if healthy {
                tracing::info!(backend = %backend, "Backend marked healthy");
            } else {
                tracing::warn!(backend = %backend, outcome = outcome.label(), "Backend marked unhealthy");
            }
        }

        metrics::record_probe(backend.address(), outcome.label());
        metrics::record_backend_health(backend.address(), healthy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::stub::StubUpstream;
    use crate::load_balancer::BackendPool;

    const A: &str = "http://10.0.0.1:8081";
    const B: &str = "http://10.0.0.2:8082";
    const C: &str = "http://10.0.0.3:8083";

    fn context() -> Arc<EngineContext> {
        let pool = BackendPool::new(vec![
            Backend::parse(A).unwrap(),
            Backend::parse(B).unwrap(),
            Backend::parse(C).unwrap(),
        ]);
        Arc::new(EngineContext::new(pool))
    }

    fn monitor(context: Arc<EngineContext>, stub: Arc<StubUpstream>) -> HealthMonitor {
        HealthMonitor::new(context, HealthCheckConfig::default(), stub)
    }

    #[tokio::test]
    async fn classifies_each_backend_independently() {
        let context = context();
        let stub = Arc::new(
            StubUpstream::new()
                .failing("10.0.0.2:8082")
                .status("10.0.0.3:8083", StatusCode::NO_CONTENT),
        );
        let monitor = monitor(context.clone(), stub.clone());

        monitor.check_all().await;

        assert!(context.registry().is_healthy(A));
        assert!(!context.registry().is_healthy(B));
        assert!(!context.registry().is_healthy(C), "only 200 counts as healthy");
        assert_eq!(stub.call_count(), 3, "every backend probed exactly once");
    }

    #[tokio::test]
    async fn probes_use_get_on_configured_path() {
        let context = context();
        let stub = Arc::new(StubUpstream::new());
        let mut config = HealthCheckConfig::default();
        config.path = "/health".into();
        let monitor = HealthMonitor::new(context, config, stub.clone());

        monitor.check_all().await;

        for call in stub.calls() {
            assert_eq!(call.method, Method::GET);
            assert_eq!(call.uri.path(), "/health");
            assert_eq!(call.headers.get(header::USER_AGENT).unwrap(), USER_AGENT);
        }
    }

    #[tokio::test]
    async fn later_cycle_overwrites_earlier_verdict() {
        let context = context();
        monitor(context.clone(), Arc::new(StubUpstream::new()))
            .check_all()
            .await;
        assert!(context.registry().is_healthy(B));

        monitor(context.clone(), Arc::new(StubUpstream::new().failing("10.0.0.2:8082")))
            .check_all()
            .await;
        assert!(!context.registry().is_healthy(B));
        assert!(context.registry().is_healthy(A));
    }

    #[tokio::test]
    async fn run_probes_immediately_and_stops_on_shutdown() {
        let context = context();
        let stub = Arc::new(StubUpstream::new());
        let monitor = monitor(context.clone(), stub.clone());
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor.run(rx));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(stub.call_count(), 3, "first cycle has no initial delay");
        assert!(context.registry().is_healthy(A));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should exit on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_monitor_returns_without_probing() {
        let stub = Arc::new(StubUpstream::new());
        let mut config = HealthCheckConfig::default();
        config.enabled = false;
        let monitor = HealthMonitor::new(context(), config, stub.clone());
        let (_tx, rx) = broadcast::channel(1);

        monitor.run(rx).await;
        assert_eq!(stub.call_count(), 0);
    }
}
