//! External bridge capability and the connection manager built on it.

mod twitter;

pub use twitter::TwitterBridge;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::models::{BridgeRequest, RemoteAccount, Ticker};

/// Errors from the external account lookup. Never surfaced to API callers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No application credentials configured.
    #[error("bridge not configured")]
    NotConfigured,

    /// The ticker has no stored credentials.
    #[error("ticker {0} has no bridge credentials")]
    MissingCredentials(i64),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// Lookup of the external account linked to a ticker.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Fetch the descriptor of the account behind the ticker's credentials.
    async fn user(&self, ticker: &Ticker) -> Result<RemoteAccount, BridgeError>;
}

/// Bridge used when no application credentials are configured.
pub struct DisabledBridge;

#[async_trait]
impl Bridge for DisabledBridge {
    async fn user(&self, _ticker: &Ticker) -> Result<RemoteAccount, BridgeError> {
        Err(BridgeError::NotConfigured)
    }
}

/// Build the bridge described by the configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn Bridge>, BridgeError> {
    match &config.twitter {
        Some(twitter) => Ok(Arc::new(TwitterBridge::new(twitter.clone())?)),
        None => {
            tracing::info!("Twitter bridge disabled (no consumer credentials)");
            Ok(Arc::new(DisabledBridge))
        }
    }
}

/// Apply a bridge request to a ticker's connection.
///
/// A disconnect wins over every other field. Otherwise credentials are
/// merged, the active flag is taken as sent and, once a complete pair is
/// switched on, the remote account is refreshed.
/// A failed lookup keeps the previous account.
pub async fn apply_request(ticker: &mut Ticker, request: &BridgeRequest, bridge: &dyn Bridge) {
    if request.disconnect {
        ticker.bridge.disconnect();
        tracing::info!(ticker_id = ticker.id, "Bridge disconnected");
        return;
    }

    ticker
        .bridge
        .configure(&request.token, &request.secret, request.active);

    if !ticker.bridge.is_connected() {
        return;
    }

    match bridge.user(ticker).await {
        Ok(account) => {
            ticker.bridge.record_account(account);
        }
        Err(e) => {
            tracing::warn!(ticker_id = ticker.id, "Bridge account lookup failed: {}", e);
        }
    }
}
