//! Generic tab snapshots
//!
//! Any data tab that is not the canonical tracker is stored as an opaque
//! snapshot: one serialized row per (tab_id, row_index). Loading a tab
//! replaces its previous snapshot entirely; the delete and inserts run in
//! one transaction so readers never observe a half-replaced tab.

use crate::rows::Row;
use crate::{Error, Result};
use sqlx::SqlitePool;

/// Replace the full snapshot for `tab_id` with `rows`, in order
pub async fn replace_tab(pool: &SqlitePool, tab_id: &str, rows: &[Row]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM generic_tab_rows WHERE tab_id = ?")
        .bind(tab_id)
        .execute(&mut *tx)
        .await?;

    for (index, row) in rows.iter().enumerate() {
        let data = serde_json::to_string(row)
            .map_err(|e| Error::Internal(format!("serialize tab row: {e}")))?;
        sqlx::query("INSERT INTO generic_tab_rows (tab_id, row_index, data) VALUES (?, ?, ?)")
            .bind(tab_id)
            .bind(index as i64)
            .bind(data)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Snapshot rows for one tab, in stored order
pub async fn list_tab(pool: &SqlitePool, tab_id: &str) -> Result<Vec<Row>> {
    let raw: Vec<(String,)> =
        sqlx::query_as("SELECT data FROM generic_tab_rows WHERE tab_id = ? ORDER BY row_index")
            .bind(tab_id)
            .fetch_all(pool)
            .await?;

    raw.iter()
        .map(|(data,)| {
            serde_json::from_str(data)
                .map_err(|e| Error::Internal(format!("corrupt tab row in {tab_id}: {e}")))
        })
        .collect()
}

/// Distinct tab ids with stored data, sorted
pub async fn list_tab_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let ids: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT tab_id FROM generic_tab_rows ORDER BY tab_id")
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}
