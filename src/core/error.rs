//! Typed error taxonomy for the exposure core
//!
//! Every failure in this crate maps to exactly one variant and one HTTP
//! status code. Guard failures short-circuit before any query or
//! serialization work runs, so a denied request never observes partial
//! data. Nothing is retried or swallowed here; callers pick the rendering
//! surface (JSON envelope or HTML page).
//!
//! The JSON envelope is part of the external contract:
//!
//! ```json
//! { "status": "error", "error_code": 403, "error_name": "forbidden",
//!   "error_message": "administrator access required" }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::fmt;
use uuid::Uuid;

/// The error type surfaced by guards, queries and the serializer
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Bad limit, order or filter attribute; or a corrupt cursor
    InvalidQuery(String),

    /// No resolvable identity on a protected operation
    Unauthorized(String),

    /// Authenticated but lacking the required privilege
    Forbidden(String),

    /// Entity (or path) absent
    NotFound {
        kind: &'static str,
        id: Option<Uuid>,
    },

    /// Method not acceptable on this path; produced by the routing layer
    MethodNotAllowed,

    /// An optional feature is not configured. Answers 418, a deliberate
    /// quirk preserved from the original contract; downstream clients
    /// match on it.
    FeatureDisabled(&'static str),

    /// Anything unanticipated
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidQuery(msg) => write!(f, "{}", msg),
            ApiError::Unauthorized(msg) => write!(f, "{}", msg),
            ApiError::Forbidden(msg) => write!(f, "{}", msg),
            ApiError::NotFound { kind, id: Some(id) } => {
                write!(f, "{} with id '{}' not found", kind, id)
            }
            ApiError::NotFound { kind, id: None } => write!(f, "{} not found", kind),
            ApiError::MethodNotAllowed => write!(f, "method not allowed"),
            ApiError::FeatureDisabled(feature) => {
                write!(f, "the {} feature is not configured", feature)
            }
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::FeatureDisabled(_) => StatusCode::IM_A_TEAPOT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the snake_case error name used in the JSON envelope
    pub fn error_name(&self) -> &'static str {
        match self {
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound { .. } => "not_found",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::FeatureDisabled(_) => "feature_disabled",
            ApiError::Internal(_) => "internal_server_error",
        }
    }

    /// Build the uniform JSON error envelope
    pub fn envelope(&self) -> Value {
        json!({
            "status": "error",
            "error_code": self.status_code().as_u16(),
            "error_name": self.error_name(),
            "error_message": self.to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}
