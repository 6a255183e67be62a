//! Ticker membership: which users may manage which ticker.
//!
//! The relation lives in the `user_tickers` join table; this module is its
//! only writer.

use std::sync::Arc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::guard;
use crate::models::{Ticker, User};

pub struct MembershipManager {
    repo: Arc<Repository>,
}

impl MembershipManager {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Existence first, then permission. Resolves the ticker whose members
    /// a caller may manage.
    pub async fn authorized_ticker(&self, caller: &User, ticker_id: i64) -> Result<Ticker, AppError> {
        let ticker = self
            .repo
            .get_ticker(ticker_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticker {} not found", ticker_id)))?;
        guard::authorize(caller, ticker.id).check()?;
        Ok(ticker)
    }

    /// Members of a ticker as seen by `caller`.
    pub async fn list(&self, caller: &User, ticker_id: i64) -> Result<Vec<User>, AppError> {
        let ticker = self.authorized_ticker(caller, ticker_id).await?;
        self.list_members(&ticker).await
    }

    /// Revoke one user's access and return the remaining members.
    ///
    /// Ticker existence, permission, then user existence.
    pub async fn remove(
        &self,
        caller: &User,
        ticker_id: i64,
        user_id: i64,
    ) -> Result<Vec<User>, AppError> {
        let ticker = self.authorized_ticker(caller, ticker_id).await?;
        let user = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        self.remove_member(&ticker, &user).await?;
        self.list_members(&ticker).await
    }

    /// Every user whose set contains the ticker, ordered by user ID.
    pub async fn list_members(&self, ticker: &Ticker) -> Result<Vec<User>, AppError> {
        self.repo.users_by_ticker(ticker.id).await
    }

    /// Add the ticker to each user's set.
    ///
    /// Unknown users are skipped and reported as `NotFound` once the batch
    /// is done. A store failure stops the batch; earlier additions stay.
    pub async fn add_members(&self, ticker: &Ticker, user_ids: &[i64]) -> Result<(), AppError> {
        let mut missing = Vec::new();

        for &user_id in user_ids {
            if self.repo.get_user(user_id).await?.is_none() {
                missing.push(user_id);
                continue;
            }
            if self.repo.add_user_ticker(user_id, ticker.id).await? {
                tracing::info!(ticker_id = ticker.id, user_id, "Member added");
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            tracing::warn!(ticker_id = ticker.id, ?missing, "Unknown users in member batch");
            Err(AppError::NotFound(format!("Users {:?} not found", missing)))
        }
    }

    /// Remove the ticker from the user's set. No-op if absent.
    pub async fn remove_member(&self, ticker: &Ticker, user: &User) -> Result<(), AppError> {
        if self.repo.remove_user_ticker(user.id, ticker.id).await? {
            tracing::info!(ticker_id = ticker.id, user_id = user.id, "Member removed");
        }
        Ok(())
    }
}
