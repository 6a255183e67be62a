//! Authorization guard.
//!
//! Pure decisions over a resolved caller. Existence of the target ticker is
//! never inspected here; each operation decides whether it resolves the
//! ticker before or after asking the guard.

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::User;

/// Outcome of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Forbidden,
}

impl Access {
    /// Turn a denial into [`AppError::Forbidden`].
    pub fn check(self) -> Result<(), AppError> {
        match self {
            Access::Allowed => Ok(()),
            Access::Forbidden => Err(AppError::Forbidden),
        }
    }
}

/// May `caller` manage the ticker with `ticker_id`?
pub fn authorize(caller: &User, ticker_id: i64) -> Access {
    if caller.is_super_admin || caller.tickers.contains(&ticker_id) {
        Access::Allowed
    } else {
        Access::Forbidden
    }
}

/// Only superadmins may create, delete or reset tickers.
pub fn require_admin(caller: &User) -> Access {
    if caller.is_super_admin {
        Access::Allowed
    } else {
        Access::Forbidden
    }
}

/// Resolve the authenticated user ID to the current user record.
pub async fn resolve_caller(repo: &Repository, user_id: i64) -> Result<User, AppError> {
    repo.get_user(user_id)
        .await?
        .ok_or(AppError::CallerNotFound)
}
