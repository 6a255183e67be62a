//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for tickers, messages and users.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tickers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            creation_date TEXT NOT NULL,
            domain TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 0,
            prepend_time INTEGER NOT NULL DEFAULT 0,
            hashtags TEXT NOT NULL DEFAULT '[]',
            info_author TEXT NOT NULL DEFAULT '',
            info_url TEXT NOT NULL DEFAULT '',
            info_email TEXT NOT NULL DEFAULT '',
            info_twitter TEXT NOT NULL DEFAULT '',
            info_facebook TEXT NOT NULL DEFAULT '',
            twitter_token TEXT NOT NULL DEFAULT '',
            twitter_secret TEXT NOT NULL DEFAULT '',
            twitter_active INTEGER NOT NULL DEFAULT 0,
            twitter_user TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticker_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            creation_date TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            creation_date TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_super_admin INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_tickers (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            ticker_id INTEGER NOT NULL REFERENCES tickers(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, ticker_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_messages_ticker_id ON messages(ticker_id);
        CREATE INDEX IF NOT EXISTS idx_user_tickers_ticker_id ON user_tickers(ticker_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
pub mod testing {
    //! Throwaway databases for tests.

    use tempfile::TempDir;

    use super::{init_database, Repository};

    /// Open a fresh repository in a temp dir. Keep the dir alive for the test.
    pub async fn temp_repository() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }
}
