//! JSON Schema compilation, validation, and string coercion.
//!
//! # Responsibilities
//! - Compile schema documents once at registration time
//! - Validate inputs and outputs, reporting per-field issues
//! - Plan and apply string-to-primitive coercion for URL-sourced values
//!
//! # Design Decisions
//! - Coercion is planned from the schema's top-level `properties` only;
//!   nested objects arrive through JSON bodies and are already typed
//! - A value that cannot be coerced is left untouched so the validator
//!   reports it with the schema's own wording
//! - `$ref` is resolved one level for field schemas, which covers the
//!   shapes derive-generated schemas produce

use std::collections::HashMap;

use schemars::JsonSchema;
use serde_json::Value;
use thiserror::Error;

use crate::error::ValidationIssue;

/// Error produced when a schema document cannot be compiled.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("schema is not a valid JSON Schema document: {0}")]
    Compile(String),
}

/// A schema document compiled into a reusable validator.
pub struct CompiledSchema {
    schema: Value,
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    /// Compile a schema document. Format assertions are enabled so a
    /// `date-time` field rejects strings that only look like timestamps.
    pub fn compile(schema: Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self { schema, validator })
    }

    /// The source schema document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate an instance, collecting every failure.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<ValidationIssue>> {
        let issues: Vec<ValidationIssue> = self
            .validator
            .iter_errors(instance)
            .map(|err| {
                let path = err
                    .instance_path
                    .to_string()
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect();
                ValidationIssue::new(path, err.to_string())
            })
            .collect();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Generate the schema document for a Rust type.
///
/// Panics only if the generated schema fails to serialize, which would be a
/// bug in the type's `JsonSchema` derive rather than a runtime condition.
pub fn schema_value_for<T: JsonSchema>() -> Value {
    let root = schemars::schema_for!(T);
    serde_json::to_value(root).expect("generated schema serializes to JSON")
}

/// Primitive target of a planned coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionKind {
    Integer,
    Number,
    Boolean,
    DateTime,
}

/// Per-field coercion derived from an object schema's top-level properties.
///
/// Query and path parameters always arrive as strings. The plan rewrites
/// those strings into the primitive the schema declares before validation,
/// so `?limit=5` satisfies an integer field.
#[derive(Debug, Clone, Default)]
pub struct CoercionPlan {
    fields: HashMap<String, CoercionKind>,
}

impl CoercionPlan {
    /// Build a plan from a schema document. Non-object schemas and objects
    /// without properties produce an empty plan.
    pub fn from_schema(schema: &Value) -> Self {
        let mut fields = HashMap::new();
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, field_schema) in properties {
                let resolved = resolve_ref(schema, field_schema);
                if let Some(kind) = coercion_kind(resolved) {
                    fields.insert(name.clone(), kind);
                }
            }
        }
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rewrite string values in place for every planned field.
    pub fn apply(&self, input: &mut Value) {
        let Some(object) = input.as_object_mut() else {
            return;
        };
        for (name, kind) in &self.fields {
            if let Some(value) = object.get_mut(name) {
                if let Value::String(text) = value {
                    if let Some(coerced) = coerce_string(*kind, text) {
                        *value = coerced;
                    }
                }
            }
        }
    }
}

/// Follow a `#/definitions/..` or `#/$defs/..` reference one level.
fn resolve_ref<'a>(root: &'a Value, field_schema: &'a Value) -> &'a Value {
    let Some(reference) = field_schema.get("$ref").and_then(Value::as_str) else {
        return field_schema;
    };
    for (prefix, key) in [("#/definitions/", "definitions"), ("#/$defs/", "$defs")] {
        if let Some(name) = reference.strip_prefix(prefix) {
            if let Some(resolved) = root.get(key).and_then(|defs| defs.get(name)) {
                return resolved;
            }
        }
    }
    field_schema
}

/// Decide the coercion target for one field schema, if any.
fn coercion_kind(field_schema: &Value) -> Option<CoercionKind> {
    let type_name = match field_schema.get("type") {
        Some(Value::String(name)) => name.as_str(),
        // Nullable fields derive as `["boolean", "null"]`; the first
        // non-null entry carries the payload type.
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null")?,
        _ => return None,
    };
    match type_name {
        "integer" => Some(CoercionKind::Integer),
        "number" => Some(CoercionKind::Number),
        "boolean" => Some(CoercionKind::Boolean),
        "string" => {
            let format = field_schema.get("format").and_then(Value::as_str)?;
            matches!(format, "date-time" | "date").then_some(CoercionKind::DateTime)
        }
        _ => None,
    }
}

/// Coerce one string to its planned primitive; `None` means leave it alone.
fn coerce_string(kind: CoercionKind, text: &str) -> Option<Value> {
    match kind {
        CoercionKind::Integer => {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Number(n.into()));
            }
            let f = text.parse::<f64>().ok()?;
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                Some(Value::Number((f as i64).into()))
            } else {
                None
            }
        }
        CoercionKind::Number => {
            let f = text.parse::<f64>().ok()?;
            serde_json::Number::from_f64(f).map(Value::Number)
        }
        CoercionKind::Boolean => {
            if text.eq_ignore_ascii_case("true") || text == "1" {
                Some(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") || text == "0" {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        CoercionKind::DateTime => {
            // Bare dates widen to midnight UTC; full timestamps pass through
            // untouched for the validator to judge.
            if chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
                Some(Value::String(format!("{text}T00:00:00Z")))
            } else {
                None
            }
        }
    }
}
