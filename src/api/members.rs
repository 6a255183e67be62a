//! Ticker member API endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;

use super::{parse_body, parse_id, success, ApiResult, Keyed};
use crate::auth::Claims;
use crate::guard;
use crate::models::User;
use crate::AppState;

/// Request body for granting users access to a ticker.
#[derive(Debug, Deserialize)]
pub struct AddMembersRequest {
    pub users: Vec<i64>,
}

/// GET /v1/admin/tickers/{ticker_id}/users - List a ticker's members.
pub async fn list_ticker_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
) -> ApiResult<Keyed<Vec<User>>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let id = parse_id(&ticker_id)?;

    let users = state.members.list(&me, id).await?;
    success("users", users)
}

/// PUT /v1/admin/tickers/{ticker_id}/users - Grant users access to a ticker.
pub async fn add_ticker_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
    body: Bytes,
) -> ApiResult<Keyed<Vec<User>>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let id = parse_id(&ticker_id)?;
    let ticker = state.members.authorized_ticker(&me, id).await?;
    let request: AddMembersRequest = parse_body(&body)?;

    state.members.add_members(&ticker, &request.users).await?;
    let users = state.members.list_members(&ticker).await?;
    success("users", users)
}

/// DELETE /v1/admin/tickers/{ticker_id}/users/{user_id} - Revoke a user's access.
pub async fn delete_ticker_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((ticker_id, user_id)): Path<(String, String)>,
) -> ApiResult<Keyed<Vec<User>>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let ticker_id = parse_id(&ticker_id)?;
    let user_id = parse_id(&user_id)?;

    let users = state.members.remove(&me, ticker_id, user_id).await?;
    success("users", users)
}
