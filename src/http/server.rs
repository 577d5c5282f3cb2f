//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Bound the number of requests handled at once
//! - Spawn the health monitor and the admin API next to the proxy listener
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::ProxyConfig;
use crate::engine::{Dispatcher, EngineContext};
use crate::health::HealthMonitor;
use crate::http::client::{HttpUpstream, Upstream};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::{internal_error, panic_response};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Permits for concurrently handled requests.
    pub in_flight: Arc<Semaphore>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, max_in_flight: usize) -> Self {
        Self {
            dispatcher,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
        }
    }
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    context: Arc<EngineContext>,
    monitor: HealthMonitor,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let context = Arc::new(EngineContext::from_config(&config));

        let forward_client = Arc::new(HttpUpstream::new(
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.forward_secs),
        ));
        let probe_timeout = Duration::from_secs(config.health_check.timeout_secs);
        let probe_client = Arc::new(HttpUpstream::new(probe_timeout, probe_timeout));

        Self::with_upstreams(config, context, forward_client, probe_client)
    }

    /// Create a server around an existing context and outbound clients.
    pub fn with_upstreams(
        config: ProxyConfig,
        context: Arc<EngineContext>,
        forward_client: Arc<dyn Upstream>,
        probe_client: Arc<dyn Upstream>,
    ) -> Self {
        let dispatcher = Dispatcher::new(context.clone(), forward_client);
        let state = AppState::new(dispatcher, config.listener.max_in_flight);
        let monitor = HealthMonitor::new(context.clone(), config.health_check.clone(), probe_client);

        let router = build_router(state);
        Self {
            router,
            config,
            context,
            monitor,
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.context.pool().len(),
            "HTTP server starting"
        );

        tokio::spawn(self.monitor.run(shutdown.resubscribe()));

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin = setup_admin_router(AdminState::new(
                self.context.clone(),
                self.config.admin.api_key.clone(),
            ));
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The shared engine state (registry, pool, cursor).
    pub fn context(&self) -> Arc<EngineContext> {
        self.context.clone()
    }

    /// A handle to the proxy router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
///
/// Every path and method goes to the same handler; there are no routing rules.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let _permit = match state.in_flight.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            tracing::error!(error = %e, "In-flight limiter closed");
            return internal_error();
        }
    };

    state.dispatcher.handle(request).await
}
