//! One structured error type, per `spec.md` §7: a message, a short
//! machine-parsable code, an HTTP status, and an optional detail map.
//! Handlers return `Result<_, ApiError>`; axum turns the `Err` arm into
//! the JSON envelope via `IntoResponse`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// An opaque, implementation-defined error kind with its own machine
    /// code and status, for failures that don't fit the factory shortcuts.
    #[error("{message}")]
    Opaque {
        message: String,
        code: String,
        status: StatusCode,
        details: HashMap<String, Value>,
    },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// A `bad_request` whose machine code distinguishes it from a generic
    /// validation failure, e.g. `invalid_challenge`.
    pub fn with_code(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Opaque {
            message: message.into(),
            code: code.into(),
            status,
            details: HashMap::new(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Opaque { status, code, .. } => (*status, code.as_str()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        let mut body = json!({
            "error": message,
            "code": code,
        });

        if let ApiError::Opaque { details, .. } = &self {
            if let Value::Object(ref mut map) = body {
                for (k, v) in details {
                    map.insert(k.clone(), v.clone());
                }
            }
        }

        (status, Json(body)).into_response()
    }
}
