//! HTTP-to-RPC Gateway (v1)
//!
//! Exposes namespaced RPC procedures over plain HTTP routes, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 RPC GATEWAY                  │
//!                      │                                              │
//!   Client Request     │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!   ───────────────────┼─▶│  http  │───▶│ dispatch │───▶│ routing  │  │
//!                      │  │ server │    │ pipeline │    │ registry │  │
//!                      │  └────────┘    └──────────┘    └────┬─────┘  │
//!                      │                                     │        │
//!                      │                                     ▼        │
//!   Client Response    │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!   ◀──────────────────┼──│  JSON  │◀───│  schema  │◀───│procedure │  │
//!                      │  │ render │    │ validate │    │ handler  │  │
//!                      │  └────────┘    └──────────┘    └──────────┘  │
//!                      │                                              │
//!                      │  ┌────────────────────────────────────────┐  │
//!                      │  │  config    observability    lifecycle  │  │
//!                      │  └────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use clap::Parser;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rpc_gateway::{
    config, observability, Dispatcher, GatewayServer, Procedure, ProcedureRouter, Registry,
    RegistryOptions, RequestContext, RpcError,
};

#[derive(Parser, Debug)]
#[command(name = "rpc-gateway", version, about = "HTTP-to-RPC gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoInput {
    /// Message to echo back.
    message: String,
    /// How many copies to return, capped at 16.
    repeat: Option<u32>,
}

async fn system_status(_ctx: RequestContext, _input: Value) -> Result<Value, RpcError> {
    Ok(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn system_echo(_ctx: RequestContext, input: Value) -> Result<Value, RpcError> {
    let input: EchoInput =
        serde_json::from_value(input).map_err(|err| RpcError::bad_request(err.to_string()))?;
    let copies = input.repeat.unwrap_or(1).min(16) as usize;
    Ok(json!({ "messages": vec![input.message; copies] }))
}

/// Built-in procedures shipped with the gateway binary.
fn gateway_router() -> ProcedureRouter {
    let system = ProcedureRouter::new()
        .procedure(
            "status",
            Procedure::query(system_status)
                .route(Method::GET, "/system/status")
                .description("Liveness and version report"),
        )
        .procedure(
            "echo",
            Procedure::mutation(system_echo)
                .route(Method::POST, "/system/echo")
                .description("Echo a message back, optionally repeated")
                .input::<EchoInput>(),
        );

    ProcedureRouter::new().nest("system", system)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load_or_default(args.config.as_deref())?;

    observability::logging::init(&config.observability.log_level);

    tracing::info!("rpc-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Err(error) =
            observability::metrics::init_metrics(&config.observability.metrics_address)
        {
            tracing::error!(error = %error, "Failed to start metrics exporter");
        }
    }

    let registry = Registry::compile_with(
        gateway_router(),
        RegistryOptions {
            reject_conflicts: config.routing.reject_conflicts,
        },
    )?;

    let dispatcher =
        Dispatcher::new(Arc::new(registry)).max_body_bytes(config.limits.max_body_bytes);

    let server = GatewayServer::new(config, dispatcher);
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
