//! Audit trail, record comments, discussions, and user feedback
//!
//! `record_activity` is append-only: normal flow never mutates or deletes
//! entries, and they survive deletion of the record they describe.

use crate::time::now_iso;
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// One audit entry against a tracker record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub record_key: String,
    pub at: String,
    pub action: String,
    pub actor: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub record_key: String,
    pub created_at: String,
    pub author: String,
    pub body: String,
}

/// Discussion post; `parent_id` is None for top-level posts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscussionPost {
    pub id: i64,
    pub created_at: String,
    pub author: String,
    pub message: String,
    pub parent_id: Option<i64>,
}

/// Append one audit entry inside an open transaction
pub async fn log_activity(
    conn: &mut SqliteConnection,
    record_key: &str,
    action: &str,
    actor: &str,
    details: &str,
    at: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO record_activity (record_key, at, action, actor, details) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(record_key.trim())
    .bind(at)
    .bind(action)
    .bind(actor.trim())
    .bind(details.trim())
    .execute(conn)
    .await?;
    Ok(())
}

/// Activity for one record, newest first (capped at 50 as the UI shows)
pub async fn list_record_activity(pool: &SqlitePool, record_key: &str) -> Result<Vec<ActivityEntry>> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        "SELECT * FROM record_activity WHERE record_key = ? ORDER BY at DESC, id DESC LIMIT 50",
    )
    .bind(record_key.trim())
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Recent activity across all records, for the dashboard feed
pub async fn list_recent_activity(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityEntry>> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        "SELECT * FROM record_activity ORDER BY at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

pub async fn add_comment(
    pool: &SqlitePool,
    record_key: &str,
    author: &str,
    body: &str,
) -> Result<()> {
    let author = author.trim();
    sqlx::query(
        "INSERT INTO record_comments (record_key, created_at, author, body) VALUES (?, ?, ?, ?)",
    )
    .bind(record_key.trim())
    .bind(now_iso())
    .bind(if author.is_empty() { "Anonymous" } else { author })
    .bind(body.trim())
    .execute(pool)
    .await?;
    Ok(())
}

/// Comments for one record, oldest first (thread order)
pub async fn list_comments(pool: &SqlitePool, record_key: &str) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM record_comments WHERE record_key = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(record_key.trim())
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

/// Add a discussion post or reply (parent_id = None for top-level)
pub async fn insert_discussion(
    pool: &SqlitePool,
    author: &str,
    message: &str,
    parent_id: Option<i64>,
) -> Result<()> {
    let author = author.trim();
    sqlx::query(
        "INSERT INTO app_discussions (created_at, author, message, parent_id) VALUES (?, ?, ?, ?)",
    )
    .bind(now_iso())
    .bind(if author.is_empty() { "Anonymous" } else { author })
    .bind(message.trim())
    .bind(parent_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Posts and replies, newest first
pub async fn list_discussions(pool: &SqlitePool, limit: i64) -> Result<Vec<DiscussionPost>> {
    let posts = sqlx::query_as::<_, DiscussionPost>(
        "SELECT * FROM app_discussions ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(posts)
}

/// Feedback about the tracker itself; `page` says where it was sent from
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackEntry {
    pub id: i64,
    pub created_at: String,
    pub author: String,
    pub message: String,
    pub page: Option<String>,
}

pub async fn insert_feedback(
    pool: &SqlitePool,
    author: &str,
    message: &str,
    page: Option<&str>,
) -> Result<()> {
    let author = author.trim();
    sqlx::query(
        "INSERT INTO tracker_feedback (created_at, author, message, page) VALUES (?, ?, ?, ?)",
    )
    .bind(now_iso())
    .bind(if author.is_empty() { "Anonymous" } else { author })
    .bind(message.trim())
    .bind(page.map(str::trim))
    .execute(pool)
    .await?;
    Ok(())
}

/// Feedback entries, newest first
pub async fn list_feedback(pool: &SqlitePool, limit: i64) -> Result<Vec<FeedbackEntry>> {
    let entries = sqlx::query_as::<_, FeedbackEntry>(
        "SELECT * FROM tracker_feedback ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_activity_appends_in_order() {
        let pool = init_memory_database().await.unwrap();
        let mut tx = pool.begin().await.unwrap();
        log_activity(&mut tx, "R1", "created", "alice", "", "2024-01-01T00:00:00Z")
            .await
            .unwrap();
        log_activity(&mut tx, "R1", "updated", "bob", "", "2024-01-02T00:00:00Z")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let entries = list_record_activity(&pool, "R1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "updated"); // newest first
        assert_eq!(entries[1].actor.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_comments_default_author() {
        let pool = init_memory_database().await.unwrap();
        add_comment(&pool, "R1", "  ", "needs review").await.unwrap();
        let comments = list_comments(&pool, "R1").await.unwrap();
        assert_eq!(comments[0].author, "Anonymous");
        assert_eq!(comments[0].body, "needs review");
    }

    #[tokio::test]
    async fn test_discussion_replies_reference_parent() {
        let pool = init_memory_database().await.unwrap();
        insert_discussion(&pool, "alice", "kickoff", None).await.unwrap();
        let top = list_discussions(&pool, 10).await.unwrap();
        insert_discussion(&pool, "bob", "reply", Some(top[0].id)).await.unwrap();

        let posts = list_discussions(&pool, 10).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].parent_id, Some(top[0].id));
        assert_eq!(posts[1].parent_id, None);
    }

    #[tokio::test]
    async fn test_feedback_newest_first_with_default_author() {
        let pool = init_memory_database().await.unwrap();
        insert_feedback(&pool, "", "export button broken", Some("/records"))
            .await
            .unwrap();
        insert_feedback(&pool, "alice", "love the summary page", None)
            .await
            .unwrap();

        let entries = list_feedback(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].author, "alice");
        assert_eq!(entries[1].author, "Anonymous");
        assert_eq!(entries[1].page.as_deref(), Some("/records"));
    }

    #[tokio::test]
    async fn test_recent_activity_limit() {
        let pool = init_memory_database().await.unwrap();
        let mut tx = pool.begin().await.unwrap();
        for i in 0..5 {
            log_activity(&mut tx, &format!("R{i}"), "created", "", "", &now_iso())
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();
        assert_eq!(list_recent_activity(&pool, 3).await.unwrap().len(), 3);
    }
}
