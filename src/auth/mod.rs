//! Bearer token authentication and password hashing.
//!
//! Tokens only carry the user ID; the caller record is resolved per request
//! so permission changes apply immediately.

use std::sync::Arc;

use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Claims of an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub exp: usize,
}

/// JWT authentication layer function that takes the signing secret as a parameter.
pub async fn jwt_auth_layer(secret: Arc<String>, mut request: Request, next: Next) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let Some(token) = bearer else {
        return AppError::Unauthorized("missing bearer token".to_string()).into_response();
    };

    match verify_token(&secret, &token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Issue a token for `user_id` valid for `ttl_hours`.
pub fn issue_token(secret: &str, user_id: i64, ttl_hours: i64) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Token encoding failed: {}", e);
        AppError::Store(format!("token encoding failed: {}", e))
    })
}

/// Verify signature and expiry of a token.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized("invalid bearer token".to_string())
    })
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Store(format!("password hashing failed: {}", e)))
}

/// Check a password against a stored Argon2 hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
