//! HTTP-to-RPC Gateway Library

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod procedure;
pub mod routing;
pub mod schema;

pub use config::GatewayConfig;
pub use dispatch::context::RequestContext;
pub use dispatch::{DispatchInfo, Dispatcher, ResponseMeta};
pub use error::{ErrorCode, ErrorEnvelope, RpcError, ValidationIssue};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use procedure::{Procedure, ProcedureKind};
pub use routing::{ProcedureRouter, Registry, RegistryOptions};
