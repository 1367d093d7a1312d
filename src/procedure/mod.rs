//! Procedure definitions and invocation.
//!
//! # Responsibilities
//! - Describe a callable unit: kind, HTTP binding, schemas, handler
//! - Offer a builder that works with derived or hand-written schemas
//! - Run a call end to end: coerce, validate input, invoke, validate output
//!
//! # Design Decisions
//! - Handlers are `async fn(RequestContext, Value) -> Result<Value, RpcError>`
//!   behind a trait object, so closures and custom types both fit
//! - Derive-based schema setters panic on a bad schema at registration time,
//!   matching how route builders treat programmer errors; raw-document
//!   setters return `Result` because the document may come from outside
//! - A panicking handler is caught and reported as an internal error so one
//!   bad call cannot take the worker down

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use futures_util::FutureExt;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::context::RequestContext;
use crate::error::RpcError;
use crate::schema::{schema_value_for, CoercionPlan, CompiledSchema, SchemaError};

/// Whether a procedure reads or mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Query => "query",
            ProcedureKind::Mutation => "mutation",
        }
    }
}

/// The HTTP method and path template a procedure is exposed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    pub method: Method,
    pub path: String,
}

/// The unit of work behind a route.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: RequestContext, input: Value) -> Result<Value, RpcError>;
}

/// Adapter that lets plain async closures act as handlers.
struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext, input: Value) -> Result<Value, RpcError> {
        (self.f)(ctx, input).await
    }
}

/// Compiled input handling: the validator plus its coercion plan.
#[derive(Debug)]
struct InputSpec {
    schema: CompiledSchema,
    plan: CoercionPlan,
}

/// A registered callable: kind, optional HTTP binding, schemas, handler.
pub struct Procedure {
    kind: ProcedureKind,
    description: Option<String>,
    route: Option<RouteBinding>,
    input: Option<InputSpec>,
    output: Option<CompiledSchema>,
    handler: Arc<dyn Handler>,
}

impl Procedure {
    fn new(kind: ProcedureKind, handler: Arc<dyn Handler>) -> Self {
        Self {
            kind,
            description: None,
            route: None,
            input: None,
            output: None,
            handler,
        }
    }

    /// A read-only procedure from an async closure.
    pub fn query<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        Self::new(ProcedureKind::Query, Arc::new(FnHandler { f }))
    }

    /// A state-changing procedure from an async closure.
    pub fn mutation<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        Self::new(ProcedureKind::Mutation, Arc::new(FnHandler { f }))
    }

    /// A procedure backed by a custom [`Handler`] implementation.
    pub fn from_handler(kind: ProcedureKind, handler: Arc<dyn Handler>) -> Self {
        Self::new(kind, handler)
    }

    /// Expose this procedure on an HTTP method and path template.
    pub fn route(mut self, method: Method, path: impl Into<String>) -> Self {
        self.route = Some(RouteBinding {
            method,
            path: path.into(),
        });
        self
    }

    /// Human-readable summary, surfaced by the procedure listing.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Derive the input schema from a Rust type.
    ///
    /// Panics if the derived schema fails to compile, which indicates a bug
    /// in the type definition rather than a runtime condition.
    pub fn input<T: JsonSchema>(self) -> Self {
        match self.input_schema(schema_value_for::<T>()) {
            Ok(procedure) => procedure,
            Err(err) => panic!("derived input schema failed to compile: {err}"),
        }
    }

    /// Attach a hand-written input schema document.
    pub fn input_schema(mut self, schema: Value) -> Result<Self, SchemaError> {
        let plan = CoercionPlan::from_schema(&schema);
        let schema = CompiledSchema::compile(schema)?;
        self.input = Some(InputSpec { schema, plan });
        Ok(self)
    }

    /// Derive the output schema from a Rust type.
    ///
    /// Panics under the same conditions as [`Procedure::input`].
    pub fn output<T: JsonSchema>(self) -> Self {
        match self.output_schema(schema_value_for::<T>()) {
            Ok(procedure) => procedure,
            Err(err) => panic!("derived output schema failed to compile: {err}"),
        }
    }

    /// Attach a hand-written output schema document.
    pub fn output_schema(mut self, schema: Value) -> Result<Self, SchemaError> {
        self.output = Some(CompiledSchema::compile(schema)?);
        Ok(self)
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn binding(&self) -> Option<&RouteBinding> {
        self.route.as_ref()
    }

    /// True when the procedure declares no input schema. Such procedures
    /// receive `null` and the dispatcher skips body and query handling.
    pub fn is_void_input(&self) -> bool {
        self.input.is_none()
    }

    pub fn input_schema_value(&self) -> Option<&Value> {
        self.input.as_ref().map(|spec| spec.schema.schema())
    }

    pub fn output_schema_value(&self) -> Option<&Value> {
        self.output.as_ref().map(CompiledSchema::schema)
    }

    /// Run a call end to end.
    ///
    /// Input coercion and validation run first, then the handler inside a
    /// panic guard, then output validation. Output failures surface as
    /// internal errors because they are bugs in the procedure, not the
    /// caller's fault.
    pub async fn invoke(&self, ctx: RequestContext, mut input: Value) -> Result<Value, RpcError> {
        if let Some(spec) = &self.input {
            spec.plan.apply(&mut input);
            spec.schema
                .validate(&input)
                .map_err(RpcError::input_validation)?;
        }
        let call = self.handler.call(ctx, input);
        let output = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result?,
            Err(panic) => return Err(RpcError::internal(panic_message(panic))),
        };
        if let Some(schema) = &self.output {
            if schema.validate(&output).is_err() {
                return Err(RpcError::internal("Output validation failed"));
            }
        }
        Ok(output)
    }
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("kind", &self.kind)
            .field("route", &self.route)
            .field("has_input", &self.input.is_some())
            .field("has_output", &self.output.is_some())
            .finish()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        format!("procedure panicked: {text}")
    } else if let Some(text) = panic.downcast_ref::<String>() {
        format!("procedure panicked: {text}")
    } else {
        "procedure panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, JsonSchema)]
    struct EchoInput {
        message: String,
    }

    fn test_ctx() -> RequestContext {
        RequestContext::for_testing(Method::POST, "/echo")
    }

    #[test]
    fn test_builder_records_binding_and_kind() {
        let procedure = Procedure::query(|_ctx, _input| async { Ok(json!(null)) })
            .route(Method::GET, "/system/status")
            .description("Liveness probe");
        assert_eq!(procedure.kind(), ProcedureKind::Query);
        assert!(procedure.is_void_input());
        let binding = procedure.binding().unwrap();
        assert_eq!(binding.method, Method::GET);
        assert_eq!(binding.path, "/system/status");
        assert_eq!(procedure.description_text(), Some("Liveness probe"));
    }

    #[tokio::test]
    async fn test_invoke_passes_validated_input_through() {
        let procedure = Procedure::mutation(|_ctx, input| async move {
            Ok(json!({ "echoed": input["message"] }))
        })
        .input::<EchoInput>();
        let output = procedure
            .invoke(test_ctx(), json!({ "message": "hi" }))
            .await
            .unwrap();
        assert_eq!(output, json!({ "echoed": "hi" }));
    }

    #[tokio::test]
    async fn test_invoke_rejects_invalid_input_with_issues() {
        let procedure =
            Procedure::mutation(|_ctx, _input| async { Ok(json!(null)) }).input::<EchoInput>();
        let err = procedure
            .invoke(test_ctx(), json!({ "message": 5 }))
            .await
            .unwrap_err();
        assert!(err.is_input_validation());
        let issues = err.issues().unwrap();
        assert_eq!(issues[0].path, vec!["message".to_string()]);
    }

    #[tokio::test]
    async fn test_invoke_coerces_before_validating() {
        #[derive(Debug, Deserialize, Serialize, JsonSchema)]
        struct Counted {
            count: u32,
        }
        let procedure =
            Procedure::query(|_ctx, input| async move { Ok(input) }).input::<Counted>();
        let output = procedure
            .invoke(test_ctx(), json!({ "count": "3" }))
            .await
            .unwrap();
        assert_eq!(output, json!({ "count": 3 }));
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_internal_error() {
        let procedure = Procedure::query(|_ctx, _input| async {
            panic!("boom");
            #[allow(unreachable_code)]
            Ok(json!(null))
        });
        let err = procedure.invoke(test_ctx(), Value::Null).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::Internal);
        assert!(err.message().contains("boom"));
    }

    #[tokio::test]
    async fn test_nonconforming_output_is_an_internal_error() {
        let procedure = Procedure::query(|_ctx, _input| async { Ok(json!({ "ok": "yes" })) })
            .output_schema(json!({
                "type": "object",
                "properties": { "ok": { "type": "boolean" } },
                "required": ["ok"]
            }))
            .unwrap();
        let err = procedure.invoke(test_ctx(), Value::Null).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::Internal);
        assert_eq!(err.message(), "Output validation failed");
    }

    #[tokio::test]
    async fn test_handler_error_propagates_unchanged() {
        let procedure = Procedure::query(|_ctx, _input| async {
            Err(RpcError::new(ErrorCode::Forbidden, "no access"))
        });
        let err = procedure.invoke(test_ctx(), Value::Null).await.unwrap_err();
        assert_eq!(err.code(), &ErrorCode::Forbidden);
        assert_eq!(err.message(), "no access");
    }

    #[tokio::test]
    async fn test_custom_handler_type_works_like_a_closure() {
        struct CountingHandler {
            calls: std::sync::atomic::AtomicU64,
        }

        #[async_trait]
        impl Handler for CountingHandler {
            async fn call(&self, _ctx: RequestContext, _input: Value) -> Result<Value, RpcError> {
                let n = self
                    .calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(json!({ "call": n + 1 }))
            }
        }

        let handler = Arc::new(CountingHandler {
            calls: std::sync::atomic::AtomicU64::new(0),
        });
        let procedure = Procedure::from_handler(ProcedureKind::Mutation, handler);
        assert_eq!(procedure.kind(), ProcedureKind::Mutation);
        let first = procedure.invoke(test_ctx(), Value::Null).await.unwrap();
        let second = procedure.invoke(test_ctx(), Value::Null).await.unwrap();
        assert_eq!(first, json!({ "call": 1 }));
        assert_eq!(second, json!({ "call": 2 }));
    }
}
