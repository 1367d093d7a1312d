//! Request dispatch pipeline.
//!
//! # Responsibilities
//! - Translate an HTTP request into a procedure invocation
//! - Assemble input from query string, body, and path placeholders
//! - Render success and error responses through the hook chain
//! - Record per-procedure metrics for every dispatch
//!
//! # Design Decisions
//! - `dispatch` is total: every outcome, including handler panics and
//!   malformed bodies, becomes a well-formed JSON response
//! - A HEAD request for an unknown path answers 204 so liveness probes
//!   stay cheap and quiet
//! - Hooks see the call site (procedure name, kind, context) so one
//!   response-meta function can serve the whole registry
//!
//! # Data Flow
//! ```text
//!  Request ── normalize path ── registry lookup ──(miss)── HEAD? 204 : NOT_FOUND
//!                                    │
//!                                 (match)
//!                                    │
//!            context hook ── input assembly ── coerce ── validate
//!                                    │
//!                                 handler
//!                                    │
//!            response meta ── render JSON ── metrics + DispatchInfo
//! ```

pub mod context;
mod input;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorEnvelope, RpcError};
use crate::observability::metrics;
use crate::procedure::ProcedureKind;
use crate::routing::{normalize_path, Registry, ResolvedCall};
use context::RequestContext;

/// Body cap applied when the caller does not configure one.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const SERIALIZE_FAILURE_BODY: &str =
    r#"{"message":"Failed to serialize response","code":"INTERNAL"}"#;

/// Builds per-request extensions before the handler runs.
pub type ContextFn = Arc<dyn Fn(&Parts) -> Extensions + Send + Sync>;

/// Inspects a finished call and may override status or headers.
pub type ResponseMetaFn = Arc<dyn Fn(&ResponseMetaArgs<'_>) -> Option<ResponseMeta> + Send + Sync>;

/// Observes every error before it is rendered.
pub type ErrorHookFn = Arc<dyn Fn(&ErrorHookArgs<'_>) + Send + Sync>;

/// What the response-meta hook gets to see.
pub struct ResponseMetaArgs<'a> {
    pub ctx: Option<&'a RequestContext>,
    pub procedure: Option<&'a str>,
    pub kind: Option<ProcedureKind>,
    pub success: bool,
    pub error: Option<&'a RpcError>,
}

/// Status and header overrides returned by the response-meta hook.
///
/// `header` replaces any value the handler set; `append_header` adds
/// another value alongside existing ones.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    status: Option<StatusCode>,
    replace: Vec<(HeaderName, HeaderValue)>,
    append: Vec<(HeaderName, HeaderValue)>,
}

impl ResponseMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.replace.push((name, value));
        self
    }

    pub fn append_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.append.push((name, value));
        self
    }

    fn apply(&self, status: &mut StatusCode, headers: &mut HeaderMap) {
        if let Some(overridden) = self.status {
            *status = overridden;
        }
        for (name, value) in &self.replace {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.append {
            headers.append(name.clone(), value.clone());
        }
    }
}

/// What the error hook gets to see.
pub struct ErrorHookArgs<'a> {
    pub error: &'a RpcError,
    pub procedure: Option<&'a str>,
    pub method: &'a Method,
    pub path: &'a str,
    pub request_id: &'a str,
}

/// Dispatch outcome attached to the response extensions, for outer layers
/// that want procedure-level labels.
#[derive(Debug, Clone)]
pub struct DispatchInfo {
    pub procedure: Option<String>,
    pub kind: Option<ProcedureKind>,
    pub matched: bool,
}

/// Everything render needs to know about where a call landed.
struct CallSite<'a> {
    procedure: Option<&'a str>,
    kind: Option<ProcedureKind>,
    method: &'a Method,
    path: &'a str,
    request_id: &'a str,
}

/// Turns HTTP requests into procedure calls against a compiled registry.
pub struct Dispatcher {
    registry: Arc<Registry>,
    context_fn: Option<ContextFn>,
    response_meta: Option<ResponseMetaFn>,
    on_error: Option<ErrorHookFn>,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            context_fn: None,
            response_meta: None,
            on_error: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Install a hook that builds per-request extensions for handlers.
    pub fn context_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Parts) -> Extensions + Send + Sync + 'static,
    {
        self.context_fn = Some(Arc::new(f));
        self
    }

    /// Install a hook that may override response status and headers.
    pub fn response_meta<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseMetaArgs<'_>) -> Option<ResponseMeta> + Send + Sync + 'static,
    {
        self.response_meta = Some(Arc::new(f));
        self
    }

    /// Install an observer that sees every error before rendering.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ErrorHookArgs<'_>) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Cap request body size. Oversize bodies fail with PAYLOAD_TOO_LARGE.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run one request through the pipeline. Never fails; every outcome is
    /// a complete response.
    pub async fn dispatch(&self, req: Request<Body>) -> Response {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = normalize_path(parts.uri.path());
        let request_id = request_id_of(&parts);

        let (mut response, info) = self
            .route_call(parts, body, &method, &path, &request_id)
            .await;

        let procedure_label = info.procedure.as_deref().unwrap_or("unmatched");
        metrics::record_dispatch(
            procedure_label,
            method.as_str(),
            response.status().as_u16(),
            started,
        );

        response.extensions_mut().insert(info);
        response
    }

    async fn route_call(
        &self,
        parts: Parts,
        body: Body,
        method: &Method,
        path: &str,
        request_id: &str,
    ) -> (Response, DispatchInfo) {
        let Some(resolved) = self.registry.lookup(method, path) else {
            let info = DispatchInfo {
                procedure: None,
                kind: None,
                matched: false,
            };
            if *method == Method::HEAD {
                tracing::debug!(path = %path, "HEAD probe on unmatched path");
                return (no_content(), info);
            }
            let site = CallSite {
                procedure: None,
                kind: None,
                method,
                path,
                request_id,
            };
            let error = RpcError::not_found(format!("Route not found for {method} {path}"));
            return (self.render_error(None, &site, error), info);
        };

        let ResolvedCall {
            name,
            procedure,
            params,
        } = resolved;
        let info = DispatchInfo {
            procedure: Some(name.clone()),
            kind: Some(procedure.kind()),
            matched: true,
        };
        let site = CallSite {
            procedure: Some(&name),
            kind: Some(procedure.kind()),
            method,
            path,
            request_id,
        };

        let extensions = self
            .context_fn
            .as_ref()
            .map(|build| build(&parts))
            .unwrap_or_default();
        let ctx = RequestContext::new(
            request_id.to_string(),
            method.clone(),
            path.to_string(),
            parts.headers.clone(),
            extensions,
        );

        // Void-input procedures never touch the body or query string.
        let input_value = if procedure.is_void_input() {
            Value::Null
        } else if input::accepts_body(method) {
            match input::read_json_body(body, self.max_body_bytes).await {
                Ok(object) => input::merge_params(object, params),
                Err(error) => return (self.render_error(Some(&ctx), &site, error), info),
            }
        } else {
            input::merge_params(input::parse_query(parts.uri.query()), params)
        };

        tracing::debug!(
            request_id = %request_id,
            procedure = %name,
            kind = %procedure.kind().as_str(),
            "Dispatching procedure"
        );

        match procedure.invoke(ctx.clone(), input_value).await {
            Ok(output) => (
                self.render_success(&ctx, &name, procedure.kind(), output),
                info,
            ),
            Err(error) => (self.render_error(Some(&ctx), &site, error), info),
        }
    }

    fn render_success(
        &self,
        ctx: &RequestContext,
        procedure: &str,
        kind: ProcedureKind,
        output: Value,
    ) -> Response {
        let mut status = StatusCode::OK;
        let mut headers = ctx.response_headers().take();
        if let Some(meta_fn) = &self.response_meta {
            let args = ResponseMetaArgs {
                ctx: Some(ctx),
                procedure: Some(procedure),
                kind: Some(kind),
                success: true,
                error: None,
            };
            if let Some(meta) = meta_fn(&args) {
                meta.apply(&mut status, &mut headers);
            }
        }
        json_response(status, headers, &output)
    }

    fn render_error(
        &self,
        ctx: Option<&RequestContext>,
        site: &CallSite<'_>,
        error: RpcError,
    ) -> Response {
        if let Some(hook) = &self.on_error {
            hook(&ErrorHookArgs {
                error: &error,
                procedure: site.procedure,
                method: site.method,
                path: site.path,
                request_id: site.request_id,
            });
        }
        tracing::warn!(
            request_id = %site.request_id,
            method = %site.method,
            path = %site.path,
            procedure = site.procedure.unwrap_or("-"),
            code = %error.code(),
            error = %error.message(),
            "Request failed"
        );

        let mut status = error.http_status();
        let mut headers = ctx
            .map(|ctx| ctx.response_headers().take())
            .unwrap_or_default();
        if let Some(meta_fn) = &self.response_meta {
            let args = ResponseMetaArgs {
                ctx,
                procedure: site.procedure,
                kind: site.kind,
                success: false,
                error: Some(&error),
            };
            if let Some(meta) = meta_fn(&args) {
                meta.apply(&mut status, &mut headers);
            }
        }
        let envelope = ErrorEnvelope::from_error(&error);
        json_response(status, headers, &envelope)
    }
}

/// Prefer the id an outer layer already assigned; mint one otherwise.
fn request_id_of(parts: &Parts) -> String {
    parts
        .headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn no_content() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

fn json_response(status: StatusCode, extra_headers: HeaderMap, body: &impl Serialize) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response.headers_mut().extend(extra_headers);
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize response body");
            let mut response = Response::new(Body::from(SERIALIZE_FAILURE_BODY));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
    }
}
