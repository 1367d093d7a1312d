//! Per-request context handed to procedure handlers.
//!
//! # Responsibilities
//! - Expose request identity: id, method, path, headers
//! - Carry caller-provided extensions built by the context hook
//! - Collect response headers a handler wants on the reply
//!
//! # Design Decisions
//! - The context is cheap to clone; shared pieces sit behind `Arc`
//! - Response headers go through a mutex because handlers may fan out
//!   work that reports headers concurrently

use std::sync::{Arc, Mutex};

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{Extensions, Method};

/// Headers a handler wants set on the eventual response.
///
/// The dispatcher drains these into the reply before any response-meta
/// overrides run, so hook output always wins.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    inner: Arc<Mutex<HeaderMap>>,
}

impl ResponseHeaders {
    /// Set a header, replacing any previous value.
    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.inner
            .lock()
            .expect("response header mutex poisoned")
            .insert(name, value);
    }

    /// Add another value for a header, keeping existing ones.
    pub fn append(&self, name: HeaderName, value: HeaderValue) {
        self.inner
            .lock()
            .expect("response header mutex poisoned")
            .append(name, value);
    }

    /// Drain the collected headers, leaving the map empty.
    pub(crate) fn take(&self) -> HeaderMap {
        std::mem::take(
            &mut *self
                .inner
                .lock()
                .expect("response header mutex poisoned"),
        )
    }
}

/// Context cloned into every handler invocation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: Method,
    path: String,
    headers: Arc<HeaderMap>,
    extensions: Arc<Extensions>,
    response: ResponseHeaders,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: String,
        method: Method,
        path: String,
        headers: HeaderMap,
        extensions: Extensions,
    ) -> Self {
        Self {
            request_id,
            method,
            path,
            headers: Arc::new(headers),
            extensions: Arc::new(extensions),
            response: ResponseHeaders::default(),
        }
    }

    /// The id assigned to this request, also echoed in `x-request-id`.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized request path that matched the route.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Fetch a value the context hook stored for this request.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Headers the handler wants on the response.
    pub fn response_headers(&self) -> &ResponseHeaders {
        &self.response
    }

    #[cfg(test)]
    pub(crate) fn for_testing(method: Method, path: &str) -> Self {
        Self::new(
            "test-request".to_string(),
            method,
            path.to_string(),
            HeaderMap::new(),
            Extensions::new(),
        )
    }
}
