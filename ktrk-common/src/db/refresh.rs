//! Data refresh log
//!
//! Records each successful import for freshness display and for the
//! opportunistic auto-refresh check (no scheduler thread; requests ask
//! "is a refresh due?" and trigger one when the configured interval has
//! elapsed).

use crate::time::{now_iso, seconds_since};
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshEntry {
    pub id: i64,
    pub refreshed_at: String,
    pub source: String,
    pub tabs_count: Option<i64>,
}

/// Log one successful refresh
pub async fn log_refresh(pool: &SqlitePool, source: &str, tabs_count: i64) -> Result<()> {
    // Caller-supplied label; cap by chars, byte truncation can split one
    let source: String = source.trim().to_lowercase().chars().take(50).collect();
    sqlx::query("INSERT INTO data_refresh_log (refreshed_at, source, tabs_count) VALUES (?, ?, ?)")
        .bind(now_iso())
        .bind(source)
        .bind(tabs_count)
        .execute(pool)
        .await?;
    Ok(())
}

/// Most recent refresh entry, if any
pub async fn last_refresh(pool: &SqlitePool) -> Result<Option<RefreshEntry>> {
    let entry = sqlx::query_as::<_, RefreshEntry>(
        "SELECT * FROM data_refresh_log ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// True when auto-refresh is enabled and at least `minutes` have elapsed
/// since the last logged refresh (or none was ever logged)
pub async fn refresh_due(pool: &SqlitePool, enabled: bool, minutes: u32) -> Result<bool> {
    if !enabled {
        return Ok(false);
    }
    match last_refresh(pool).await? {
        None => Ok(true),
        Some(entry) => match seconds_since(&entry.refreshed_at) {
            Some(secs) => Ok(secs >= minutes as i64 * 60),
            None => Ok(true),
        },
    }
}
