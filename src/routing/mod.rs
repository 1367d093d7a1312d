//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     ProcedureRouter (nested, dotted names)
//!     → Registry::compile
//!     → PathTemplate::compile per binding ({name} → anchored regex)
//!     → Freeze as immutable per-method route lists
//!
//! Lookup (per request):
//!     method + raw path
//!     → normalize_path
//!     → ordered scan of the method's routes
//!     → Return: ResolvedCall (procedure + placeholder values) or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled once at startup, immutable at runtime
//! - First match wins, in registration order
//! - Matching is case-insensitive and slash-insensitive at the edges

pub mod registry;
pub mod router;
pub mod template;

pub use registry::{Registry, RegistryError, RegistryOptions, ResolvedCall, RouteDescriptor};
pub use router::ProcedureRouter;
pub use template::{normalize_path, PathTemplate, TemplateError};
