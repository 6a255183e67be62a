//! User model.

use std::collections::BTreeSet;

use serde::Serialize;

/// An account allowed to manage tickers.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub creation_date: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_super_admin: bool,
    /// Tickers a non-superadmin may manage
    pub tickers: BTreeSet<i64>,
}
