//! Saved filter views and input templates
//!
//! Both are named, timestamped JSON blobs: a saved view captures filter
//! criteria, a template captures input-field defaults. User-created,
//! user-deleted, otherwise immutable.

use crate::time::now_iso;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedView {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    /// Serialized filter criteria
    pub filters_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    /// Serialized field defaults
    pub data: String,
}

pub async fn save_saved_view(
    pool: &SqlitePool,
    name: &str,
    filters: &serde_json::Value,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("view name must not be empty".to_string()));
    }
    sqlx::query("INSERT INTO saved_views (name, created_at, filters_json) VALUES (?, ?, ?)")
        .bind(name)
        .bind(now_iso())
        .bind(filters.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_saved_views(pool: &SqlitePool) -> Result<Vec<SavedView>> {
    let views = sqlx::query_as::<_, SavedView>(
        "SELECT * FROM saved_views ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(views)
}

pub async fn get_saved_view(pool: &SqlitePool, id: i64) -> Result<Option<SavedView>> {
    let view = sqlx::query_as::<_, SavedView>("SELECT * FROM saved_views WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(view)
}

pub async fn delete_saved_view(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM saved_views WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("saved view: {id}")));
    }
    Ok(())
}

pub async fn save_template(pool: &SqlitePool, name: &str, data: &serde_json::Value) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("template name must not be empty".to_string()));
    }
    sqlx::query("INSERT INTO input_templates (name, created_at, data) VALUES (?, ?, ?)")
        .bind(name)
        .bind(now_iso())
        .bind(data.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<Template>> {
    let templates = sqlx::query_as::<_, Template>(
        "SELECT * FROM input_templates ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(templates)
}

pub async fn get_template(pool: &SqlitePool, id: i64) -> Result<Option<Template>> {
    let template = sqlx::query_as::<_, Template>("SELECT * FROM input_templates WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(template)
}

pub async fn delete_template(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM input_templates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("template: {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use serde_json::json;

    #[tokio::test]
    async fn test_saved_view_lifecycle() {
        let pool = init_memory_database().await.unwrap();
        save_saved_view(&pool, "KSA only", &json!({"region": "KSA"})).await.unwrap();

        let views = list_saved_views(&pool).await.unwrap();
        assert_eq!(views.len(), 1);
        let view = get_saved_view(&pool, views[0].id).await.unwrap().unwrap();
        let filters: serde_json::Value = serde_json::from_str(&view.filters_json).unwrap();
        assert_eq!(filters["region"], "KSA");

        delete_saved_view(&pool, view.id).await.unwrap();
        assert!(list_saved_views(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_view_name_rejected() {
        let pool = init_memory_database().await.unwrap();
        let err = save_saved_view(&pool, "  ", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_template_not_found() {
        let pool = init_memory_database().await.unwrap();
        assert!(matches!(
            delete_template(&pool, 99).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_template_roundtrip() {
        let pool = init_memory_database().await.unwrap();
        save_template(&pool, "weekly entry", &json!({"region": "KSA", "status": "Draft"}))
            .await
            .unwrap();
        let templates = list_templates(&pool).await.unwrap();
        let stored = get_template(&pool, templates[0].id).await.unwrap().unwrap();
        assert_eq!(stored.name, "weekly entry");
    }
}
