//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{BridgeConnection, Information, RemoteAccount, Ticker, TickerFields, User};

const TICKER_COLUMNS: &str = "id, creation_date, domain, title, description, active, \
     prepend_time, hashtags, info_author, info_url, info_email, info_twitter, info_facebook, \
     twitter_token, twitter_secret, twitter_active, twitter_user";

const USER_COLUMNS: &str = "id, creation_date, email, password_hash, is_super_admin";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close the pool, waiting for in-flight connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ==================== TICKER OPERATIONS ====================

    /// List all tickers, newest first.
    pub async fn list_tickers(&self) -> Result<Vec<Ticker>, AppError> {
        let sql = format!("SELECT {} FROM tickers ORDER BY id DESC", TICKER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(ticker_from_row).collect())
    }

    /// List the tickers with the given IDs, newest first. Unknown IDs are skipped.
    pub async fn list_tickers_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<Ticker>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM tickers WHERE id IN (", TICKER_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(ticker_from_row).collect())
    }

    /// Get a ticker by ID.
    pub async fn get_ticker(&self, id: i64) -> Result<Option<Ticker>, AppError> {
        let sql = format!("SELECT {} FROM tickers WHERE id = ?", TICKER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(ticker_from_row))
    }

    /// Insert a new ticker with a disconnected bridge. The store assigns the ID.
    pub async fn insert_ticker(&self, fields: &TickerFields) -> Result<Ticker, AppError> {
        let now = Utc::now().to_rfc3339();
        let hashtags_json = serde_json::to_string(&fields.hashtags)?;

        let result = sqlx::query(
            r#"INSERT INTO tickers (
                creation_date, domain, title, description, active, prepend_time, hashtags,
                info_author, info_url, info_email, info_twitter, info_facebook
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&now)
        .bind(&fields.domain)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.active as i32)
        .bind(fields.prepend_time as i32)
        .bind(&hashtags_json)
        .bind(&fields.information.author)
        .bind(&fields.information.url)
        .bind(&fields.information.email)
        .bind(&fields.information.twitter)
        .bind(&fields.information.facebook)
        .execute(&self.pool)
        .await?;

        Ok(Ticker {
            id: result.last_insert_rowid(),
            creation_date: now,
            domain: fields.domain.clone(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            active: fields.active,
            prepend_time: fields.prepend_time,
            hashtags: fields.hashtags.clone(),
            information: fields.information.clone(),
            bridge: BridgeConnection::Disconnected,
        })
    }

    /// Persist every column of an existing ticker.
    pub async fn save_ticker(&self, ticker: &Ticker) -> Result<(), AppError> {
        let affected = write_ticker(&self.pool, ticker).await?;
        if affected == 0 {
            return Err(AppError::NotFound(format!("Ticker {} not found", ticker.id)));
        }
        Ok(())
    }

    /// Delete a ticker and its messages, messages first, in one transaction.
    ///
    /// Returns the number of messages removed.
    pub async fn delete_ticker(&self, id: i64) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let messages = sqlx::query("DELETE FROM messages WHERE ticker_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM tickers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Ticker {} not found", id)));
        }

        tx.commit().await?;
        Ok(messages)
    }

    /// Delete a ticker's messages and persist its reset state in one transaction.
    ///
    /// Returns the number of messages removed.
    pub async fn reset_ticker(&self, ticker: &Ticker) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let messages = sqlx::query("DELETE FROM messages WHERE ticker_id = ?")
            .bind(ticker.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if write_ticker(&mut *tx, ticker).await? == 0 {
            return Err(AppError::NotFound(format!("Ticker {} not found", ticker.id)));
        }

        tx.commit().await?;
        Ok(messages)
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by ID, including the authorized-ticker set.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.user_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    /// Get a user by email address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.user_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    /// Create a user without any ticker memberships.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        is_super_admin: bool,
    ) -> Result<User, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (creation_date, email, password_hash, is_super_admin) VALUES (?, ?, ?, ?)",
        )
        .bind(&now)
        .bind(email)
        .bind(password_hash)
        .bind(is_super_admin as i32)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            creation_date: now,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_super_admin,
            tickers: BTreeSet::new(),
        })
    }

    /// Count all users.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    /// Users whose authorized-ticker set contains `ticker_id`, ordered by user ID.
    pub async fn users_by_ticker(&self, ticker_id: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT u.id, u.creation_date, u.email, u.password_hash, u.is_super_admin
               FROM users u
               JOIN user_tickers ut ON ut.user_id = u.id
               WHERE ut.ticker_id = ?
               ORDER BY u.id"#,
        )
        .bind(ticker_id)
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            users.push(self.user_from_row(row).await?);
        }
        Ok(users)
    }

    /// Add a ticker to a user's set. Returns false if it was already present.
    pub async fn add_user_ticker(&self, user_id: i64, ticker_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO user_tickers (user_id, ticker_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(ticker_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a ticker from a user's set. Returns false if it was not present.
    pub async fn remove_user_ticker(&self, user_id: i64, ticker_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_tickers WHERE user_id = ? AND ticker_id = ?")
            .bind(user_id)
            .bind(ticker_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_tickers(&self, user_id: i64) -> Result<BTreeSet<i64>, AppError> {
        let rows = sqlx::query("SELECT ticker_id FROM user_tickers WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("ticker_id")).collect())
    }

    async fn user_from_row(&self, row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
        let id: i64 = row.get("id");
        let is_super_admin: i32 = row.get("is_super_admin");
        Ok(User {
            id,
            creation_date: row.get("creation_date"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_super_admin: is_super_admin != 0,
            tickers: self.user_tickers(id).await?,
        })
    }

    // ==================== MESSAGE FIXTURES ====================

    #[cfg(test)]
    pub async fn insert_message(&self, ticker_id: i64, text: &str) -> Result<i64, AppError> {
        let result =
            sqlx::query("INSERT INTO messages (ticker_id, text, creation_date) VALUES (?, ?, ?)")
                .bind(ticker_id)
                .bind(text)
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    #[cfg(test)]
    pub async fn count_messages(&self, ticker_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE ticker_id = ?")
            .bind(ticker_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}

// Helper functions for row conversion

async fn write_ticker<'e, E>(executor: E, ticker: &Ticker) -> Result<u64, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let hashtags_json = serde_json::to_string(&ticker.hashtags)?;
    let account_json = ticker
        .bridge
        .account()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"UPDATE tickers SET
            domain = ?, title = ?, description = ?, active = ?, prepend_time = ?, hashtags = ?,
            info_author = ?, info_url = ?, info_email = ?, info_twitter = ?, info_facebook = ?,
            twitter_token = ?, twitter_secret = ?, twitter_active = ?, twitter_user = ?
        WHERE id = ?"#,
    )
    .bind(&ticker.domain)
    .bind(&ticker.title)
    .bind(&ticker.description)
    .bind(ticker.active as i32)
    .bind(ticker.prepend_time as i32)
    .bind(&hashtags_json)
    .bind(&ticker.information.author)
    .bind(&ticker.information.url)
    .bind(&ticker.information.email)
    .bind(&ticker.information.twitter)
    .bind(&ticker.information.facebook)
    .bind(ticker.bridge.token())
    .bind(ticker.bridge.secret())
    .bind(ticker.bridge.is_active() as i32)
    .bind(&account_json)
    .bind(ticker.id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

fn ticker_from_row(row: &sqlx::sqlite::SqliteRow) -> Ticker {
    let active: i32 = row.get("active");
    let prepend_time: i32 = row.get("prepend_time");
    let hashtags: String = row.get("hashtags");
    let twitter_active: i32 = row.get("twitter_active");
    let twitter_user: Option<String> = row.get("twitter_user");

    Ticker {
        id: row.get("id"),
        creation_date: row.get("creation_date"),
        domain: row.get("domain"),
        title: row.get("title"),
        description: row.get("description"),
        active: active != 0,
        prepend_time: prepend_time != 0,
        hashtags: parse_json_array(&hashtags),
        information: Information {
            author: row.get("info_author"),
            url: row.get("info_url"),
            email: row.get("info_email"),
            twitter: row.get("info_twitter"),
            facebook: row.get("info_facebook"),
        },
        bridge: BridgeConnection::from_parts(
            row.get("twitter_token"),
            row.get("twitter_secret"),
            twitter_active != 0,
            twitter_user.and_then(|s| serde_json::from_str::<RemoteAccount>(&s).ok()),
        ),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
