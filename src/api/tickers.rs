//! Ticker API endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};

use super::{parse_body, parse_id, success, success_empty, ApiResult, Keyed};
use crate::auth::Claims;
use crate::guard;
use crate::models::{BridgeRequest, Ticker, TickerFields};
use crate::AppState;

/// GET /v1/admin/tickers - List the caller's tickers.
pub async fn list_tickers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Keyed<Vec<Ticker>>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;

    let tickers = state.tickers.list(&me).await?;
    success("tickers", tickers)
}

/// GET /v1/admin/tickers/{ticker_id} - Get a single ticker.
pub async fn get_ticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
) -> ApiResult<Keyed<Ticker>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let id = parse_id(&ticker_id)?;

    let ticker = state.tickers.get(&me, id).await?;
    success("ticker", ticker)
}

/// POST /v1/admin/tickers - Create a new ticker.
pub async fn create_ticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> ApiResult<Keyed<Ticker>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    guard::require_admin(&me).check()?;
    let fields: TickerFields = parse_body(&body)?;

    let ticker = state.tickers.create(&me, fields).await?;
    success("ticker", ticker)
}

/// PUT /v1/admin/tickers/{ticker_id} - Update a ticker.
pub async fn update_ticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
    body: Bytes,
) -> ApiResult<Keyed<Ticker>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let id = parse_id(&ticker_id)?;
    let ticker = state.tickers.authorized_ticker(&me, id).await?;
    let fields: TickerFields = parse_body(&body)?;

    let ticker = state.tickers.apply_update(ticker, fields).await?;
    success("ticker", ticker)
}

/// PUT /v1/admin/tickers/{ticker_id}/twitter - Connect, toggle or disconnect the bridge.
pub async fn update_ticker_bridge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
    body: Bytes,
) -> ApiResult<Keyed<Ticker>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    let id = parse_id(&ticker_id)?;
    let ticker = state.tickers.authorized_ticker(&me, id).await?;
    let request: BridgeRequest = parse_body(&body)?;

    let ticker = state.tickers.apply_bridge(ticker, request).await?;
    success("ticker", ticker)
}

/// PUT /v1/admin/tickers/{ticker_id}/reset - Wipe messages and deactivate.
pub async fn reset_ticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
) -> ApiResult<Keyed<Ticker>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    guard::require_admin(&me).check()?;
    let id = parse_id(&ticker_id)?;

    let ticker = state.tickers.reset(&me, id).await?;
    success("ticker", ticker)
}

/// DELETE /v1/admin/tickers/{ticker_id} - Delete a ticker and its messages.
pub async fn delete_ticker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticker_id): Path<String>,
) -> ApiResult<Option<()>> {
    let me = guard::resolve_caller(&state.repo, claims.sub).await?;
    guard::require_admin(&me).check()?;
    let id = parse_id(&ticker_id)?;

    state.tickers.delete(&me, id).await?;
    success_empty()
}
