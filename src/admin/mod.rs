pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, Router};

use crate::routing::Registry;

use self::auth::require_bearer;
use self::handlers::*;

/// Shared state for the admin endpoints.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<Registry>,
    pub api_key: String,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(registry: Arc<Registry>, api_key: String) -> Self {
        Self {
            registry,
            api_key,
            started_at: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/procedures", get(get_procedures))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}
