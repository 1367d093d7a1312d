//! Error taxonomy and wire envelope.
//!
//! # Responsibilities
//! - Define the recognized error-code tokens and their HTTP status mapping
//! - Carry structured validation issues alongside a failure
//! - Render the normalized JSON body returned on every failure path
//!
//! # Design Decisions
//! - One boundary: internal errors become wire shapes here and nowhere else
//! - Unrecognized codes keep their literal token but always map to 500
//! - The mapper is total; it never raises

use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Machine-readable error code carried in the error envelope.
///
/// The closed set mirrors the usual RPC taxonomy; anything a procedure raises
/// outside of it is preserved as [`ErrorCode::Other`] and treated as a server
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    UnprocessableContent,
    TooManyRequests,
    Internal,
    NotImplemented,
    /// A code the fixed table does not recognize.
    Other(String),
}

impl ErrorCode {
    /// Wire token for this code.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            ErrorCode::Other(token) => token,
        }
    }

    /// Parse a wire token; unknown tokens become [`ErrorCode::Other`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "PARSE_ERROR" => ErrorCode::ParseError,
            "BAD_REQUEST" => ErrorCode::BadRequest,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "FORBIDDEN" => ErrorCode::Forbidden,
            "NOT_FOUND" => ErrorCode::NotFound,
            "METHOD_NOT_SUPPORTED" => ErrorCode::MethodNotSupported,
            "TIMEOUT" => ErrorCode::Timeout,
            "CONFLICT" => ErrorCode::Conflict,
            "PRECONDITION_FAILED" => ErrorCode::PreconditionFailed,
            "PAYLOAD_TOO_LARGE" => ErrorCode::PayloadTooLarge,
            "UNPROCESSABLE_CONTENT" => ErrorCode::UnprocessableContent,
            "TOO_MANY_REQUESTS" => ErrorCode::TooManyRequests,
            "INTERNAL" => ErrorCode::Internal,
            "NOT_IMPLEMENTED" => ErrorCode::NotImplemented,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    /// HTTP status implied by this code. Unmapped codes default to 500.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ParseError => StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::UnprocessableContent => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(ErrorCode::from_token(&token))
    }
}

/// One field-level failure reported by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path of the offending value, as ordered segments (`["items", "0"]`).
    pub path: Vec<String>,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Failure raised by routing, input handling, or an invoked procedure.
///
/// Carries the code that will appear on the wire, a message, and (for input
/// validation only) the structured issue list.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    code: ErrorCode,
    message: String,
    issues: Option<Vec<ValidationIssue>>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            issues: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// An input-schema validation failure with the validator's issue list.
    ///
    /// The envelope renders these with the fixed message
    /// `Input validation failed` so API consumers see a stable shape no
    /// matter which field failed.
    pub fn input_validation(issues: Vec<ValidationIssue>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: "Input validation failed".to_string(),
            issues: Some(issues),
        }
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        self.issues.as_deref()
    }

    /// True when this failure arose from input-schema parsing.
    pub fn is_input_validation(&self) -> bool {
        self.code == ErrorCode::BadRequest && self.issues.is_some()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

/// The JSON body returned on any failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<ValidationIssue>>,
}

impl ErrorEnvelope {
    /// Map an internal error to its wire shape.
    ///
    /// Input-validation failures get the normalized message and their issues
    /// verbatim; everything else passes its message through with no issues.
    pub fn from_error(error: &RpcError) -> Self {
        if error.is_input_validation() {
            Self {
                message: "Input validation failed".to_string(),
                code: error.code.clone(),
                issues: error.issues.clone(),
            }
        } else {
            Self {
                message: error.message.clone(),
                code: error.code.clone(),
                issues: None,
            }
        }
    }
}
