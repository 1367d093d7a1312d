//! Nested procedure registration.
//!
//! # Responsibilities
//! - Collect procedures under dotted namespaces (`billing.invoices.create`)
//! - Preserve registration order for deterministic route precedence
//! - Resolve dotted names back to procedures
//!
//! # Design Decisions
//! - Segment names are validated at registration; a bad name is a
//!   programmer error and panics like a malformed route pattern would
//! - Re-registering a name replaces the earlier entry and logs a warning,
//!   so composing routers stays last-write-wins and never aborts startup

use indexmap::IndexMap;

use crate::procedure::Procedure;

#[derive(Debug)]
enum RouterNode {
    Procedure(Procedure),
    Nested(ProcedureRouter),
}

/// Builder for a tree of procedures addressed by dotted names.
#[derive(Debug, Default)]
pub struct ProcedureRouter {
    nodes: IndexMap<String, RouterNode>,
}

impl ProcedureRouter {
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Register a procedure under a segment name.
    ///
    /// Panics if the segment is empty or contains characters outside ASCII
    /// alphanumerics, `-`, and `_`.
    pub fn procedure(mut self, name: &str, procedure: Procedure) -> Self {
        assert_valid_segment(name);
        if self
            .nodes
            .insert(name.to_string(), RouterNode::Procedure(procedure))
            .is_some()
        {
            tracing::warn!(segment = %name, "Replaced existing registration");
        }
        self
    }

    /// Mount a child router under a namespace segment.
    ///
    /// Panics under the same conditions as [`ProcedureRouter::procedure`].
    pub fn nest(mut self, name: &str, router: ProcedureRouter) -> Self {
        assert_valid_segment(name);
        if self
            .nodes
            .insert(name.to_string(), RouterNode::Nested(router))
            .is_some()
        {
            tracing::warn!(segment = %name, "Replaced existing registration");
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total procedures in the tree, namespaces excluded.
    pub fn len(&self) -> usize {
        self.nodes
            .values()
            .map(|node| match node {
                RouterNode::Procedure(_) => 1,
                RouterNode::Nested(router) => router.len(),
            })
            .sum()
    }

    /// Look up a procedure by its dotted name.
    ///
    /// A namespace is not callable, so a name that stops at a nested router
    /// resolves to `None`, as does a name with leftover segments.
    pub fn resolve(&self, name: &str) -> Option<&Procedure> {
        let mut current = self;
        let mut segments = name.split('.').peekable();
        while let Some(segment) = segments.next() {
            match current.nodes.get(segment)? {
                RouterNode::Procedure(procedure) => {
                    return if segments.peek().is_none() {
                        Some(procedure)
                    } else {
                        None
                    };
                }
                RouterNode::Nested(router) => current = router,
            }
        }
        None
    }

    /// Flatten into `(dotted name, procedure)` pairs in registration order.
    pub(crate) fn into_entries(self) -> Vec<(String, Procedure)> {
        let mut entries = Vec::new();
        self.collect_into("", &mut entries);
        entries
    }

    fn collect_into(self, prefix: &str, entries: &mut Vec<(String, Procedure)>) {
        for (name, node) in self.nodes {
            let full = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}.{name}")
            };
            match node {
                RouterNode::Procedure(procedure) => entries.push((full, procedure)),
                RouterNode::Nested(router) => router.collect_into(&full, entries),
            }
        }
    }
}

fn assert_valid_segment(name: &str) {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        panic!("invalid router segment `{name}`: segments are ASCII alphanumerics, '-' or '_'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    fn noop() -> Procedure {
        Procedure::query(|_ctx, _input| async { Ok(json!(null)) })
    }

    #[test]
    fn test_nested_names_flatten_in_registration_order() {
        let router = ProcedureRouter::new()
            .procedure("ping", noop())
            .nest(
                "billing",
                ProcedureRouter::new()
                    .procedure("list", noop())
                    .nest("invoices", ProcedureRouter::new().procedure("create", noop())),
            )
            .procedure("status", noop());
        let names: Vec<String> = router
            .into_entries()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec!["ping", "billing.list", "billing.invoices.create", "status"]
        );
    }

    #[test]
    fn test_resolve_walks_dotted_names() {
        let router = ProcedureRouter::new().nest(
            "runtime",
            ProcedureRouter::new().procedure("versions", noop()),
        );
        assert!(router.resolve("runtime.versions").is_some());
        assert!(router.resolve("runtime").is_none());
        assert!(router.resolve("runtime.versions.extra").is_none());
        assert!(router.resolve("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let router = ProcedureRouter::new()
            .procedure("ping", noop().description("old"))
            .procedure("ping", noop().description("new"));
        assert_eq!(router.len(), 1);
        assert_eq!(
            router.resolve("ping").unwrap().description_text(),
            Some("new")
        );
    }

    #[test]
    fn test_len_counts_procedures_recursively() {
        let router = ProcedureRouter::new().procedure("a", noop()).nest(
            "ns",
            ProcedureRouter::new()
                .procedure("b", noop())
                .procedure("c", noop()),
        );
        assert_eq!(router.len(), 3);
        assert!(!router.is_empty());
        assert!(ProcedureRouter::new().is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid router segment")]
    fn test_dotted_segment_panics() {
        let _ = ProcedureRouter::new().procedure("bad.name", noop());
    }

    #[test]
    #[should_panic(expected = "invalid router segment")]
    fn test_empty_segment_panics() {
        let _ = ProcedureRouter::new().nest("", ProcedureRouter::new());
    }

    #[test]
    fn test_procedures_keep_their_bindings_through_flattening() {
        let router = ProcedureRouter::new().nest(
            "system",
            ProcedureRouter::new().procedure("status", noop().route(Method::GET, "/system/status")),
        );
        let entries = router.into_entries();
        let (name, procedure) = &entries[0];
        assert_eq!(name, "system.status");
        assert_eq!(procedure.binding().unwrap().path, "/system/status");
    }
}
