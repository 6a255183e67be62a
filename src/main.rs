//! Ticker Admin Backend
//!
//! REST backend for managing tickers, their members and the Twitter bridge,
//! with SQLite persistence.

mod api;
mod auth;
mod bridge;
mod config;
mod db;
mod errors;
mod guard;
mod members;
mod models;
mod tickers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bridge::Bridge;
use config::Config;
use db::Repository;
use errors::AppError;
use members::MembershipManager;
use tickers::TickerManager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub tickers: Arc<TickerManager>,
    pub members: Arc<MembershipManager>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, bridge: Arc<dyn Bridge>, config: Config) -> Self {
        Self {
            tickers: Arc::new(TickerManager::new(repo.clone(), bridge)),
            members: Arc::new(MembershipManager::new(repo.clone())),
            repo,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ticker Admin Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.jwt_secret == config::DEFAULT_JWT_SECRET {
        tracing::warn!(
            "No JWT secret configured (TICKER_JWT_SECRET). Using the development default!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    bootstrap_admin(&repo, &config).await?;

    let bridge = bridge::from_config(&config)?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(repo.clone(), bridge, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Create the configured superadmin when the user table is empty.
async fn bootstrap_admin(repo: &Repository, config: &Config) -> Result<(), AppError> {
    if repo.count_users().await? > 0 {
        return Ok(());
    }

    let Some(admin) = &config.initial_admin else {
        tracing::warn!(
            "No users exist and no initial admin configured (TICKER_INITIAL_ADMIN_EMAIL / TICKER_INITIAL_ADMIN_PASSWORD)"
        );
        return Ok(());
    };

    let hash = auth::hash_password(&admin.password)?;
    let user = repo.create_user(&admin.email, &hash, true).await?;
    tracing::info!(user_id = user.id, email = %user.email, "Created initial admin");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone secret for the auth layer
    let secret = Arc::new(state.config.jwt_secret.clone());

    // Authenticated admin routes
    let admin_routes = Router::new()
        // Tickers
        .route("/tickers", get(api::list_tickers))
        .route("/tickers", post(api::create_ticker))
        .route("/tickers/{ticker_id}", get(api::get_ticker))
        .route("/tickers/{ticker_id}", put(api::update_ticker))
        .route("/tickers/{ticker_id}", delete(api::delete_ticker))
        .route("/tickers/{ticker_id}/twitter", put(api::update_ticker_bridge))
        .route("/tickers/{ticker_id}/reset", put(api::reset_ticker))
        // Members
        .route("/tickers/{ticker_id}/users", get(api::list_ticker_users))
        .route("/tickers/{ticker_id}/users", put(api::add_ticker_users))
        .route(
            "/tickers/{ticker_id}/users/{user_id}",
            delete(api::delete_ticker_user),
        )
        // Apply JWT auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(secret.clone(), req, next)
        }));

    // Login (no auth required)
    let login_routes = Router::new().route("/login", post(api::login));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/v1/admin", admin_routes.merge(login_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
