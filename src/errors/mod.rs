//! Error handling module for the ticker backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Numeric error codes carried in the error envelope.
pub mod codes {
    pub const DEFAULT: u16 = 1000;
    pub const NOT_FOUND: u16 = 1001;
    pub const INSUFFICIENT_PERMISSIONS: u16 = 1003;
}

/// Fixed messages for outcomes that never carry details.
pub mod messages {
    pub const USER_NOT_FOUND: &str = "user not found";
    pub const NOT_FOUND: &str = "not found";
    pub const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// The authenticated caller no longer resolves to a user
    CallerNotFound,
    /// Entity absent
    NotFound(String),
    /// Authorization denied
    Forbidden,
    /// First failing field of a request body
    Validation { field: &'static str, reason: String },
    /// Underlying persistence failure
    Store(String),
    /// Malformed request (path segment or body)
    BadRequest(String),
    /// Missing or invalid credentials
    Unauthorized(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::CallerNotFound => StatusCode::NOT_FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Get the envelope error code for this error.
    pub fn error_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Forbidden => codes::INSUFFICIENT_PERMISSIONS,
            _ => codes::DEFAULT,
        }
    }

    /// Get the error message exposed to clients.
    pub fn message(&self) -> String {
        match self {
            AppError::CallerNotFound => messages::USER_NOT_FOUND.to_string(),
            AppError::NotFound(_) => messages::NOT_FOUND.to_string(),
            AppError::Forbidden => messages::INSUFFICIENT_PERMISSIONS.to_string(),
            AppError::Validation { field, reason } => format!("{}: {}", field, reason),
            AppError::Store(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(what) => write!(f, "{}: {}", self.error_code(), what),
            _ => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Store(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::debug!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: u16,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub status: String,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            data: serde_json::Map::new(),
            status: "error".to_string(),
            error: ErrorDetails {
                code: error.error_code(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
