//! Twitter account lookup over OAuth 1.0a signed requests.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use urlencoding::encode;

use super::{Bridge, BridgeError};
use crate::config::TwitterConfig;
use crate::models::{RemoteAccount, Ticker};

type HmacSha1 = Hmac<Sha1>;

const VERIFY_CREDENTIALS_PATH: &str = "/1.1/account/verify_credentials.json";

/// Bridge backed by the Twitter v1.1 REST API.
#[derive(Clone)]
pub struct TwitterBridge {
    client: Client,
    config: TwitterConfig,
}

impl TwitterBridge {
    pub fn new(config: TwitterConfig) -> Result<Self, BridgeError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    screen_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    profile_image_url_https: String,
}

impl From<TwitterUser> for RemoteAccount {
    fn from(user: TwitterUser) -> Self {
        RemoteAccount {
            name: user.name,
            screen_name: user.screen_name,
            description: user.description.unwrap_or_default(),
            image_url: user.profile_image_url_https,
        }
    }
}

#[async_trait]
impl Bridge for TwitterBridge {
    async fn user(&self, ticker: &Ticker) -> Result<RemoteAccount, BridgeError> {
        let credentials = ticker
            .bridge
            .credentials()
            .ok_or(BridgeError::MissingCredentials(ticker.id))?;

        let url = format!("{}{}", self.base_url(), VERIFY_CREDENTIALS_PATH);
        let query = [("skip_status", "true")];
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let signer = OAuthSigner {
            consumer_key: &self.config.consumer_key,
            consumer_secret: &self.config.consumer_secret,
            token: &credentials.token,
            token_secret: &credentials.secret,
            nonce: &nonce,
            timestamp: Utc::now().timestamp(),
        };
        let header = signer.authorization_header("GET", &url, &query)?;

        let user: TwitterUser = self
            .client
            .get(&url)
            .query(&query)
            .header(AUTHORIZATION, header)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(ticker_id = ticker.id, screen_name = %user.screen_name, "Fetched bridge account");
        Ok(user.into())
    }
}

/// Inputs of an OAuth 1.0a HMAC-SHA1 signature.
struct OAuthSigner<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: &'a str,
    token_secret: &'a str,
    nonce: &'a str,
    timestamp: i64,
}

impl OAuthSigner<'_> {
    fn oauth_params(&self) -> [(&'static str, String); 6] {
        [
            ("oauth_consumer_key", self.consumer_key.to_string()),
            ("oauth_nonce", self.nonce.to_string()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", self.timestamp.to_string()),
            ("oauth_token", self.token.to_string()),
            ("oauth_version", "1.0".to_string()),
        ]
    }

    /// Signature over method, base URL and every request parameter.
    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, BridgeError> {
        let mut pairs: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
            .chain(
                self.oauth_params()
                    .into_iter()
                    .map(|(k, v)| (encode(k).into_owned(), encode(&v).into_owned())),
            )
            .collect();
        pairs.sort();

        let param_string = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let base = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(url),
            encode(&param_string)
        );
        let key = format!(
            "{}&{}",
            encode(self.consumer_secret),
            encode(self.token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| BridgeError::Signing(e.to_string()))?;
        mac.update(base.as_bytes());
        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, BridgeError> {
        let signature = self.signature(method, url, params)?;

        let mut fields: Vec<(&str, String)> = self.oauth_params().into_iter().collect();
        fields.push(("oauth_signature", signature));
        fields.sort();

        let rendered = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", rendered))
    }
}
