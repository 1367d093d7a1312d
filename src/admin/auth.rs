//! Bearer-token gate in front of the admin routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorEnvelope, RpcError};

use super::AdminState;

/// Reject any request whose `Authorization` header does not carry the
/// configured key. Failures get the same error envelope as dispatch
/// failures, so admin clients parse one shape.
pub async fn require_bearer(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if presented == Some(expected.as_str()) {
        return next.run(request).await;
    }

    let error = RpcError::unauthorized("admin credentials required");
    (error.http_status(), Json(ErrorEnvelope::from_error(&error))).into_response()
}
