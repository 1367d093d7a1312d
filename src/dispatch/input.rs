//! Input assembly from query string, JSON body, and path placeholders.
//!
//! # Responsibilities
//! - Decide which source carries the input for a given method
//! - Parse query strings and JSON bodies into a flat object
//! - Merge path placeholders over the base object
//!
//! # Design Decisions
//! - GET and DELETE read the query string; every other method reads the
//!   body; a placeholder always beats both
//! - An empty body means an empty object, so optional-only schemas accept
//!   bodyless requests
//! - Repeated query keys keep the last occurrence

use axum::body::Body;
use axum::http::Method;
use http_body_util::{BodyExt, Limited};
use serde_json::{Map, Value};

use crate::error::RpcError;

/// True when the method carries its input in the request body. Only GET
/// and DELETE are query-string methods; everything else reads the body.
pub(crate) fn accepts_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::DELETE)
}

/// Decode a query string into a JSON object of string values.
pub(crate) fn parse_query(query: Option<&str>) -> Map<String, Value> {
    let mut object = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            object.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    object
}

/// Read and parse a JSON object body, enforcing the size limit.
pub(crate) async fn read_json_body(
    body: Body,
    limit: usize,
) -> Result<Map<String, Value>, RpcError> {
    let collected = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected,
        Err(err) if err.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
            return Err(RpcError::payload_too_large(
                "request body exceeds the configured size limit",
            ));
        }
        Err(err) => {
            return Err(RpcError::parse_error(format!(
                "failed to read request body: {err}"
            )));
        }
    };
    let bytes = collected.to_bytes();
    if bytes.is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value = serde_json::from_slice(&bytes)
        .map_err(|err| RpcError::parse_error(format!("request body is not valid JSON: {err}")))?;
    match parsed {
        Value::Object(object) => Ok(object),
        _ => Err(RpcError::bad_request("request body must be a JSON object")),
    }
}

/// Lay path placeholders over the base object. Placeholders win on key
/// collisions; the template is more specific than anything the caller sent.
pub(crate) fn merge_params(base: Map<String, Value>, params: Vec<(String, String)>) -> Value {
    let mut object = base;
    for (name, value) in params {
        object.insert(name, Value::String(value));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_body_methods() {
        assert!(accepts_body(&Method::POST));
        assert!(accepts_body(&Method::PUT));
        assert!(accepts_body(&Method::PATCH));
        assert!(accepts_body(&Method::HEAD));
        assert!(!accepts_body(&Method::GET));
        assert!(!accepts_body(&Method::DELETE));
    }

    #[test]
    fn test_parse_query_decodes_and_keeps_last() {
        let object = parse_query(Some("a=1&b=hello%20world&a=2"));
        assert_eq!(object.get("a"), Some(&json!("2")));
        assert_eq!(object.get("b"), Some(&json!("hello world")));
    }

    #[test]
    fn test_parse_query_handles_absent_string() {
        assert!(parse_query(None).is_empty());
    }

    #[tokio::test]
    async fn test_empty_body_is_an_empty_object() {
        let object = read_json_body(Body::empty(), 1024).await.unwrap();
        assert!(object.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_parse_error() {
        let err = read_json_body(Body::from("{not json"), 1024)
            .await
            .unwrap_err();
        assert_eq!(err.code(), &ErrorCode::ParseError);
    }

    #[tokio::test]
    async fn test_non_object_body_is_rejected() {
        let err = read_json_body(Body::from("[1, 2, 3]"), 1024)
            .await
            .unwrap_err();
        assert_eq!(err.code(), &ErrorCode::BadRequest);
    }

    #[tokio::test]
    async fn test_oversize_body_is_payload_too_large() {
        let err = read_json_body(Body::from("x".repeat(64)), 16)
            .await
            .unwrap_err();
        assert_eq!(err.code(), &ErrorCode::PayloadTooLarge);
    }

    #[test]
    fn test_placeholders_override_base_values() {
        let mut base = Map::new();
        base.insert("id".to_string(), json!("from-body"));
        base.insert("other".to_string(), json!(true));
        let merged = merge_params(base, vec![("id".to_string(), "from-path".to_string())]);
        assert_eq!(merged, json!({ "id": "from-path", "other": true }));
    }
}
