//! REST API module.
//!
//! Handlers resolve the caller, parse path and body, and hand over to the
//! managers. Every response uses the `{data, status, error}` envelope.

mod login;
mod members;
mod tickers;

pub use login::*;
pub use members::*;
pub use tickers::*;

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::{AppError, ErrorDetails};

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status: &'static str,
    pub error: Option<ErrorDetails>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: "success",
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Payload wrapped under a single key, e.g. `{"ticker": {...}}`.
pub type Keyed<T> = BTreeMap<&'static str, T>;

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response with `payload` under `key`.
pub fn success<T: Serialize>(key: &'static str, payload: T) -> ApiResult<Keyed<T>> {
    Ok(ApiResponse::new(BTreeMap::from([(key, payload)])))
}

/// Create a successful API response with `"data": null`.
pub fn success_empty() -> ApiResult<Option<()>> {
    Ok(ApiResponse::new(None))
}

/// Parse a decimal ID path segment.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}

/// Parse a JSON body regardless of the declared content type.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    Ok(serde_json::from_slice(body)?)
}
