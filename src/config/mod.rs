//! Configuration module for the ticker backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Secret used when `TICKER_JWT_SECRET` is not set. Only suitable for development.
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials of the superadmin created on first start.
#[derive(Debug, Clone)]
pub struct InitialAdmin {
    pub email: String,
    pub password: String,
}

/// Application credentials for the Twitter bridge.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub api_url: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// HMAC secret for issued bearer tokens
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens
    pub token_ttl_hours: i64,
    pub initial_admin: Option<InitialAdmin>,
    /// Bridge is disabled when absent
    pub twitter: Option<TwitterConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("TICKER_DB_PATH")
            .unwrap_or_else(|_| "./data/ticker.sqlite".to_string())
            .into();

        let bind_raw =
            env::var("TICKER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "TICKER_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let log_level = env::var("TICKER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret =
            env::var("TICKER_JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

        let ttl_raw = env::var("TICKER_TOKEN_TTL_HOURS").unwrap_or_else(|_| "24".to_string());
        let token_ttl_hours = match ttl_raw.parse::<i64>() {
            Ok(hours) if hours > 0 => hours,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "TICKER_TOKEN_TTL_HOURS",
                    value: ttl_raw,
                })
            }
        };

        let initial_admin = match (
            non_empty_var("TICKER_INITIAL_ADMIN_EMAIL"),
            non_empty_var("TICKER_INITIAL_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(InitialAdmin { email, password }),
            _ => None,
        };

        let twitter = match (
            non_empty_var("TICKER_TWITTER_CONSUMER_KEY"),
            non_empty_var("TICKER_TWITTER_CONSUMER_SECRET"),
        ) {
            (Some(consumer_key), Some(consumer_secret)) => Some(TwitterConfig {
                consumer_key,
                consumer_secret,
                api_url: env::var("TICKER_TWITTER_API_URL")
                    .unwrap_or_else(|_| "https://api.twitter.com".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            jwt_secret,
            token_ttl_hours,
            initial_admin,
            twitter,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
