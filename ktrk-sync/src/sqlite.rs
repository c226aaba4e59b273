//! Embedded-database adapter
//!
//! Reads rows out of a SQLite file (typically the tracker's own store)
//! for the batch pipeline. Columns are discovered from the result set and
//! values decoded dynamically: string first, then integer, then real,
//! with NULL becoming the empty string, the same flattening every other
//! adapter applies.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Column, Row as SqlxRow, SqlitePool, ValueRef};

use ktrk_common::rows::Row;
use ktrk_common::{Error, Result};

/// Fetch all rows of one table
pub async fn extract_table(db_path: &Path, table: &str) -> Result<Vec<Row>> {
    if !is_valid_table_name(table) {
        return Err(Error::InvalidInput(format!("invalid table name: {table}")));
    }
    extract_query(db_path, &format!("SELECT * FROM {}", table)).await
}

/// Fetch the result of an ad hoc query
pub async fn extract_query(db_path: &Path, query: &str) -> Result<Vec<Row>> {
    let pool = connect_readonly(db_path).await?;
    let result = fetch_rows(&pool, query).await;
    pool.close().await;
    result
}

async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Source(format!(
            "SQLite database not found: {}",
            db_path.display()
        )));
    }
    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;
    Ok(pool)
}

async fn fetch_rows(pool: &SqlitePool, query: &str) -> Result<Vec<Row>> {
    let records = sqlx::query(query).fetch_all(pool).await?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let mut row = Row::new();
        for (i, column) in record.columns().iter().enumerate() {
            row.set(column.name().to_string(), decode_cell(record, i));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Stringify one cell, trying the common SQLite types in order
fn decode_cell(record: &sqlx::sqlite::SqliteRow, i: usize) -> String {
    if let Ok(raw) = record.try_get_raw(i) {
        if raw.is_null() {
            return String::new();
        }
    }
    record
        .try_get::<String, _>(i)
        .ok()
        .or_else(|| record.try_get::<i64, _>(i).ok().map(|v| v.to_string()))
        .or_else(|| {
            record.try_get::<f64, _>(i).ok().map(|v| {
                if v.fract() == 0.0 {
                    format!("{}", v as i64)
                } else {
                    v.to_string()
                }
            })
        })
        .unwrap_or_default()
}

/// Only plain identifier table names; everything else must use `query`
fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() < 100
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}
