//! Admin endpoint tests over a real listener.

use std::sync::Arc;

use axum::http::Method;
use serde_json::{json, Value};

use rpc_gateway::{Dispatcher, Procedure, ProcedureRouter, Registry};

mod common;

fn admin_router() -> ProcedureRouter {
    ProcedureRouter::new().procedure(
        "ping",
        Procedure::query(|_ctx, _input| async move { Ok(json!({ "pong": true })) })
            .route(Method::GET, "/ping")
            .description("Liveness probe"),
    )
}

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let (addr, shutdown) = common::spawn_gateway(admin_router()).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .header("Authorization", "Bearer wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_status_reports_route_count() {
    let (addr, shutdown) = common::spawn_gateway(admin_router()).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .header("Authorization", "Bearer test-admin-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["routes"], json!(1));

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_lists_procedures() {
    let (addr, shutdown) = common::spawn_gateway(admin_router()).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{}/admin/procedures", addr))
        .header("Authorization", "Bearer test-admin-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "ping");
    assert_eq!(list[0]["kind"], "query");
    assert_eq!(list[0]["method"], "GET");
    assert_eq!(list[0]["path"], "/ping");
    assert_eq!(list[0]["description"], "Liveness probe");

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_disabled_falls_through_to_dispatch() {
    let registry = Registry::compile(admin_router()).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let mut config = common::test_config();
    config.admin.enabled = false;
    let (addr, shutdown) = common::spawn_gateway_with(config, dispatcher).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{}/admin/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Route not found for GET /admin/status");

    shutdown.trigger();
}
