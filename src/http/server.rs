//! HTTP listener and middleware assembly.
//!
//! # Responsibilities
//! - Route every non-admin request into the dispatch pipeline
//! - Wire up middleware (tracing, timeout, request ID)
//! - Merge the admin router when enabled
//! - Serve until a shutdown signal, draining in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, AdminState};
use crate::config::GatewayConfig;
use crate::dispatch::{DispatchInfo, Dispatcher};

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new HTTP server around a configured dispatcher.
    pub fn new(config: GatewayConfig, dispatcher: Dispatcher) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let router = Self::build_router(&config, dispatcher);
        Self { router, config }
    }

    /// Assemble the router: dispatch wildcard plus middleware stack.
    fn build_router(config: &GatewayConfig, dispatcher: Arc<Dispatcher>) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(dispatcher.clone());

        // Static admin routes win over the wildcard in axum's route matching.
        if config.admin.enabled {
            let state = AdminState::new(
                dispatcher.registry().clone(),
                config.admin.api_key.clone(),
            );
            router = router.merge(admin::setup_admin_router(state));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http().on_response(
                |response: &Response, latency: Duration, _span: &tracing::Span| {
                    let procedure = response
                        .extensions()
                        .get::<DispatchInfo>()
                        .and_then(|info| info.procedure.as_deref())
                        .unwrap_or("-");
                    tracing::info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        procedure,
                        "Request completed"
                    );
                },
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on the given listener until the process receives Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run_until(
        self,
        listener: TcpListener,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configuration this server was built from.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Surrender the assembled router, middleware included, so the gateway
    /// can be nested inside a host application's own `Router`.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Main dispatch handler. Hands every request to the dispatcher pipeline.
async fn dispatch_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> Response {
    dispatcher.dispatch(request).await
}

/// Resolve once the process receives Ctrl+C.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
