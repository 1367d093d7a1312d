//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use rpc_gateway::config::GatewayConfig;
use rpc_gateway::lifecycle::Shutdown;
use rpc_gateway::{Dispatcher, GatewayServer, ProcedureRouter, Registry};

/// Config for tests: ephemeral port, metrics off, admin on with a fixed key.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".into();
    config
}

/// Spawn a gateway for the given procedures on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_gateway(router: ProcedureRouter) -> (SocketAddr, Shutdown) {
    let registry = Registry::compile(router).expect("test registry compiles");
    let dispatcher = Dispatcher::new(Arc::new(registry));
    spawn_gateway_with(test_config(), dispatcher).await
}

/// Spawn a gateway around a fully configured dispatcher.
pub async fn spawn_gateway_with(
    config: GatewayConfig,
    dispatcher: Dispatcher,
) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config, dispatcher);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run_until(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that ignores any proxy configured in the environment.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
