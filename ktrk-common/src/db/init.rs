//! Database initialization
//!
//! Creates the database file on first run, applies pragmas, creates all
//! tables idempotently, and runs the small column migrations older
//! databases need.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_tables(&pool).await?;
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Pool used by tests: single shared in-memory database
#[doc(hidden)]
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_tables(&pool).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    // WAL keeps readers unblocked while a refresh writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // Canonical tracked entity, upserted by record_key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracker_records (
            record_key TEXT NOT NULL PRIMARY KEY,
            report_date TEXT NOT NULL,
            site_id TEXT NOT NULL,
            site_name TEXT,
            region TEXT NOT NULL DEFAULT 'KSA',
            metric_name TEXT NOT NULL,
            value REAL,
            status TEXT,
            notes TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Generic tab snapshots: one serialized row per (tab, position)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS generic_tab_rows (
            tab_id TEXT NOT NULL,
            row_index INTEGER NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (tab_id, row_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only audit trail; outlives record deletion
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS record_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_key TEXT NOT NULL,
            at TEXT NOT NULL,
            action TEXT NOT NULL,
            actor TEXT,
            details TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS record_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_key TEXT NOT NULL,
            created_at TEXT NOT NULL,
            author TEXT NOT NULL,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_discussions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            author TEXT NOT NULL,
            message TEXT NOT NULL,
            parent_id INTEGER NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracker_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            author TEXT NOT NULL,
            message TEXT NOT NULL,
            page TEXT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_views (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            filters_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS input_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            data TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS allowed_users (
            identifier TEXT NOT NULL PRIMARY KEY,
            added_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_refresh_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            refreshed_at TEXT NOT NULL,
            source TEXT NOT NULL,
            tabs_count INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Column migrations for databases created by earlier versions
async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    ensure_column(pool, "tracker_records", "updated_at", "TEXT").await?;
    ensure_column(pool, "app_discussions", "parent_id", "INTEGER NULL").await?;
    Ok(())
}

/// Add a column if the table does not have it yet (idempotent)
async fn ensure_column(pool: &SqlitePool, table: &str, column: &str, ddl_type: &str) -> Result<()> {
    let columns = sqlx::query_as::<_, (i64, String, String, i64, Option<String>, i64)>(&format!(
        "PRAGMA table_info({})",
        table
    ))
    .fetch_all(pool)
    .await?;

    if columns.iter().any(|(_, name, ..)| name == column) {
        return Ok(());
    }

    info!("Migrating: adding {}.{}", table, column);
    sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ddl_type))
        .execute(pool)
        .await?;
    Ok(())
}
