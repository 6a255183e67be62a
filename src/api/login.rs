//! Login endpoint.

use axum::{body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

use super::{parse_body, ApiResponse, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /v1/admin/login - Exchange email and password for a bearer token.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<LoginResponse> {
    let request: LoginRequest = parse_body(&body)?;

    let user = state
        .repo
        .find_user_by_email(&request.username)
        .await?
        .filter(|user| auth::verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| AppError::Unauthorized("incorrect username or password".to_string()))?;

    let token = auth::issue_token(
        &state.config.jwt_secret,
        user.id,
        state.config.token_ttl_hours,
    )?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::new(LoginResponse { token, user }))
}
