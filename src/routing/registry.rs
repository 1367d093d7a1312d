//! Compiled route table.
//!
//! # Responsibilities
//! - Flatten a router tree into per-method route lists
//! - Match incoming method and path to a procedure, first match wins
//! - Describe registered routes for tooling and the admin surface
//!
//! # Design Decisions
//! - Immutable after compilation, shared via `Arc` without locks
//! - Routes keep registration order; precedence is explicit, not scored
//! - Re-registering the exact same method and template swaps the procedure
//!   in place, so the later definition serves the route without disturbing
//!   the precedence of anything else
//! - Templates that merely overlap are kept, flagged at build time, and
//!   resolved by registration order; strict mode refuses both cases

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;
use thiserror::Error;

use crate::procedure::{Procedure, ProcedureKind};
use crate::routing::router::ProcedureRouter;
use crate::routing::template::{normalize_path, PathTemplate, TemplateError};

/// Compilation knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    /// Fail compilation on duplicate or overlapping routes instead of
    /// logging and resolving them by registration order.
    pub reject_conflicts: bool,
}

/// Error produced while compiling a router tree.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("procedure `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
    #[error("duplicate route: `{name}` re-registers {method} {path} already owned by `{existing}`")]
    Duplicate {
        name: String,
        existing: String,
        method: Method,
        path: String,
    },
    #[error(
        "ambiguous routes: `{name}` ({method} {path}) overlaps `{existing}` ({method} {existing_path})"
    )]
    Ambiguous {
        name: String,
        existing: String,
        method: Method,
        path: String,
        existing_path: String,
    },
}

#[derive(Debug)]
struct RouteEntry {
    name: String,
    template: PathTemplate,
    procedure: Arc<Procedure>,
}

/// A matched route: the procedure plus extracted placeholder values.
#[derive(Debug)]
pub struct ResolvedCall {
    pub name: String,
    pub procedure: Arc<Procedure>,
    pub params: Vec<(String, String)>,
}

/// One registered route, borrowed from the registry for listing.
#[derive(Debug)]
pub struct RouteDescriptor<'a> {
    pub name: &'a str,
    pub method: &'a Method,
    pub path: &'a str,
    pub kind: ProcedureKind,
    pub description: Option<&'a str>,
    pub input_schema: Option<&'a Value>,
    pub output_schema: Option<&'a Value>,
}

/// Immutable table of HTTP-exposed procedures.
#[derive(Debug)]
pub struct Registry {
    routes: HashMap<Method, Vec<RouteEntry>>,
    total: usize,
}

impl Registry {
    /// Compile with default options: conflicts warn and resolve by order.
    pub fn compile(router: ProcedureRouter) -> Result<Self, RegistryError> {
        Self::compile_with(router, RegistryOptions::default())
    }

    pub fn compile_with(
        router: ProcedureRouter,
        options: RegistryOptions,
    ) -> Result<Self, RegistryError> {
        let mut routes: HashMap<Method, Vec<RouteEntry>> = HashMap::new();
        let mut total = 0usize;
        for (name, procedure) in router.into_entries() {
            let Some(binding) = procedure.binding().cloned() else {
                tracing::debug!(procedure = %name, "No route binding; not exposed over HTTP");
                continue;
            };
            let template = PathTemplate::compile(&binding.path).map_err(|source| {
                RegistryError::Template {
                    name: name.clone(),
                    source,
                }
            })?;
            let entries = routes.entry(binding.method.clone()).or_default();

            // An exact re-registration swaps the entry where it stands, so
            // the later procedure serves the route at the earlier position.
            if let Some(position) = entries
                .iter()
                .position(|entry| entry.template.path().eq_ignore_ascii_case(template.path()))
            {
                if options.reject_conflicts {
                    return Err(RegistryError::Duplicate {
                        name,
                        existing: entries[position].name.clone(),
                        method: binding.method,
                        path: template.path().to_string(),
                    });
                }
                tracing::warn!(
                    procedure = %name,
                    replaced = %entries[position].name,
                    method = %binding.method,
                    path = %template.path(),
                    "Route template re-registered; later registration wins"
                );
                entries[position] = RouteEntry {
                    name,
                    template,
                    procedure: Arc::new(procedure),
                };
                continue;
            }

            for existing in entries.iter() {
                if !templates_overlap(existing.template.path(), template.path()) {
                    continue;
                }
                if options.reject_conflicts {
                    return Err(RegistryError::Ambiguous {
                        name,
                        existing: existing.name.clone(),
                        method: binding.method,
                        path: template.path().to_string(),
                        existing_path: existing.template.path().to_string(),
                    });
                }
                tracing::warn!(
                    procedure = %name,
                    existing = %existing.name,
                    method = %binding.method,
                    path = %template.path(),
                    existing_path = %existing.template.path(),
                    "Route templates overlap; first registration wins on shared paths"
                );
            }

            entries.push(RouteEntry {
                name,
                template,
                procedure: Arc::new(procedure),
            });
            total += 1;
        }
        tracing::info!(routes = total, "Compiled procedure registry");
        Ok(Self { routes, total })
    }

    /// Match a method and path. The path may be raw; it is normalized here.
    ///
    /// Routes are scanned in registration order, so a literal route
    /// registered before a placeholder route takes precedence.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<ResolvedCall> {
        let normalized = normalize_path(path);
        let entries = self.routes.get(method)?;
        for entry in entries {
            if let Some(params) = entry.template.match_path(&normalized) {
                return Some(ResolvedCall {
                    name: entry.name.clone(),
                    procedure: Arc::clone(&entry.procedure),
                    params,
                });
            }
        }
        None
    }

    /// Every registered route, sorted by procedure name then method.
    pub fn descriptors(&self) -> Vec<RouteDescriptor<'_>> {
        let mut all: Vec<RouteDescriptor<'_>> = self
            .routes
            .iter()
            .flat_map(|(method, entries)| {
                entries.iter().map(move |entry| RouteDescriptor {
                    name: &entry.name,
                    method,
                    path: entry.template.path(),
                    kind: entry.procedure.kind(),
                    description: entry.procedure.description_text(),
                    input_schema: entry.procedure.input_schema_value(),
                    output_schema: entry.procedure.output_schema_value(),
                })
            })
            .collect();
        all.sort_by(|a, b| {
            a.name
                .cmp(b.name)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        all
    }

    /// Number of HTTP-exposed routes.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// True when some concrete path could match both templates: equal segment
/// counts, and every segment pair is either equal (ignoring case) or has a
/// placeholder on at least one side. Segments with embedded placeholders
/// count as placeholders, which errs toward flagging.
fn templates_overlap(a: &str, b: &str) -> bool {
    let a_segments: Vec<&str> = a.trim_start_matches('/').split('/').collect();
    let b_segments: Vec<&str> = b.trim_start_matches('/').split('/').collect();
    if a_segments.len() != b_segments.len() {
        return false;
    }
    a_segments.iter().zip(&b_segments).all(|(left, right)| {
        left.contains('{') || right.contains('{') || left.eq_ignore_ascii_case(right)
    })
}
