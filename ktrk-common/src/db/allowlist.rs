//! Access allowlist
//!
//! Identifiers (emails or names) permitted to use the API when the
//! allowlist is enabled. Two sources merge at check time: ids from config
//! and rows in `allowed_users`; matching is case-insensitive.

use crate::time::now_iso;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AllowedUser {
    pub identifier: String,
    pub added_at: String,
}

/// Add an identifier; returns false when it is already present
pub async fn add_allowed_user(pool: &SqlitePool, identifier: &str) -> Result<bool> {
    let id = identifier.trim();
    if id.is_empty() {
        return Err(Error::InvalidInput("identifier must not be empty".to_string()));
    }
    let result = sqlx::query("INSERT OR IGNORE INTO allowed_users (identifier, added_at) VALUES (?, ?)")
        .bind(id)
        .bind(now_iso())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove an identifier; returns false when it was not present
pub async fn remove_allowed_user(pool: &SqlitePool, identifier: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM allowed_users WHERE identifier = ?")
        .bind(identifier.trim())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_allowed_users(pool: &SqlitePool) -> Result<Vec<AllowedUser>> {
    let users = sqlx::query_as::<_, AllowedUser>(
        "SELECT * FROM allowed_users ORDER BY identifier",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// True if the identifier appears in the config ids or the table
pub async fn is_user_allowed(
    pool: &SqlitePool,
    config_ids: &[String],
    identifier: &str,
) -> Result<bool> {
    let id = identifier.trim().to_lowercase();
    if id.is_empty() {
        return Ok(false);
    }
    if config_ids.iter().any(|c| c.trim().to_lowercase() == id) {
        return Ok(true);
    }
    let stored: Vec<(String,)> = sqlx::query_as("SELECT identifier FROM allowed_users")
        .fetch_all(pool)
        .await?;
    Ok(stored.iter().any(|(s,)| s.trim().to_lowercase() == id))
}

/// Mirror the config allowlist into the table so admins can manage access
/// from the backend. A non-empty config list replaces the table contents;
/// an empty list leaves the table alone.
pub async fn sync_allowlist_from_config(pool: &SqlitePool, config_ids: &[String]) -> Result<()> {
    if config_ids.is_empty() {
        return Ok(());
    }
    let now = now_iso();
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM allowed_users").execute(&mut *tx).await?;
    for id in config_ids {
        let id = id.trim();
        if id.is_empty() {
            continue;
        }
        sqlx::query("INSERT OR IGNORE INTO allowed_users (identifier, added_at) VALUES (?, ?)")
            .bind(id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}
