//! Canonical tracker records: upsert, CRUD, counts
//!
//! `tracker_records` is keyed by `record_key`; loading a row with an
//! existing key overwrites every other field and refreshes `updated_at`.
//! Interactive create/update append audit entries; deletion leaves the
//! audit trail in place.

use crate::config::RequestContext;
use crate::db::activity::log_activity;
use crate::normalize::CANONICAL_FIELDS;
use crate::rows::Row;
use crate::time::{now_iso, today};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// One canonical tracker record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackedRecord {
    pub record_key: String,
    pub report_date: String,
    pub site_id: String,
    #[serde(default)]
    pub site_name: Option<String>,
    pub region: String,
    pub metric_name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Whether an upsert created a new record or overwrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    /// Audit action name for this outcome
    pub fn action(self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        }
    }
}

impl TrackedRecord {
    /// Build a record from a normalized row
    ///
    /// Returns None when any required-for-load field is blank. The value
    /// column is numeric-or-null: a blank or non-numeric value loads as
    /// NULL rather than failing the row.
    pub fn from_normalized(row: &Row) -> Option<Self> {
        let record_key = row.get_or_empty("record_key").trim().to_string();
        let report_date = row.get_or_empty("report_date").trim().to_string();
        let site_id = row.get_or_empty("site_id").trim().to_string();
        // No defaulting here: the required-field gate rejects rows with a
        // blank region. The 'KSA' default applies to interactive entry only.
        let region = row.get_or_empty("region").trim().to_string();
        let metric_name = row.get_or_empty("metric_name").trim().to_string();

        if record_key.is_empty()
            || report_date.is_empty()
            || site_id.is_empty()
            || region.is_empty()
            || metric_name.is_empty()
        {
            return None;
        }

        Some(Self {
            record_key,
            report_date,
            site_id,
            site_name: Some(row.get_or_empty("site_name").to_string()),
            region,
            metric_name,
            value: row.get("value").and_then(|v| v.trim().parse::<f64>().ok()),
            status: Some(row.get_or_empty("status").to_string()),
            notes: Some(row.get_or_empty("notes").to_string()),
            updated_at: None,
        })
    }

    /// Render in the standardized export column order
    pub fn to_export_row(&self) -> Row {
        let mut row = Row::new();
        for field in CANONICAL_FIELDS {
            let value = match field {
                "record_key" => self.record_key.clone(),
                "report_date" => self.report_date.clone(),
                "site_id" => self.site_id.clone(),
                "site_name" => self.site_name.clone().unwrap_or_default(),
                "region" => self.region.clone(),
                "metric_name" => self.metric_name.clone(),
                "value" => self
                    .value
                    .map(|v| {
                        if v.fract() == 0.0 {
                            format!("{}", v as i64)
                        } else {
                            v.to_string()
                        }
                    })
                    .unwrap_or_default(),
                "status" => self.status.clone().unwrap_or_default(),
                "notes" => self.notes.clone().unwrap_or_default(),
                _ => unreachable!(),
            };
            row.set(field, value);
        }
        row
    }
}

/// Insert-or-update by record_key inside an open transaction
///
/// Does not log audit entries; callers do, so batch loads can attribute
/// them to the request actor.
pub async fn upsert_record(
    conn: &mut SqliteConnection,
    record: &TrackedRecord,
    now: &str,
) -> Result<UpsertOutcome> {
    let exists: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM tracker_records WHERE record_key = ?")
            .bind(&record.record_key)
            .fetch_optional(&mut *conn)
            .await?;

    if exists.is_some() {
        sqlx::query(
            r#"
            UPDATE tracker_records SET
                report_date = ?, site_id = ?, site_name = ?, region = ?,
                metric_name = ?, value = ?, status = ?, notes = ?, updated_at = ?
            WHERE record_key = ?
            "#,
        )
        .bind(&record.report_date)
        .bind(&record.site_id)
        .bind(record.site_name.as_deref().unwrap_or(""))
        .bind(&record.region)
        .bind(&record.metric_name)
        .bind(record.value)
        .bind(record.status.as_deref().unwrap_or(""))
        .bind(record.notes.as_deref().unwrap_or(""))
        .bind(now)
        .bind(&record.record_key)
        .execute(&mut *conn)
        .await?;
        Ok(UpsertOutcome::Updated)
    } else {
        sqlx::query(
            r#"
            INSERT INTO tracker_records
                (record_key, report_date, site_id, site_name, region,
                 metric_name, value, status, notes, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.record_key)
        .bind(&record.report_date)
        .bind(&record.site_id)
        .bind(record.site_name.as_deref().unwrap_or(""))
        .bind(&record.region)
        .bind(&record.metric_name)
        .bind(record.value)
        .bind(record.status.as_deref().unwrap_or(""))
        .bind(record.notes.as_deref().unwrap_or(""))
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(UpsertOutcome::Created)
    }
}

/// Interactive create: insert plus a "created" audit entry
pub async fn insert_record(
    pool: &SqlitePool,
    record: &TrackedRecord,
    ctx: &RequestContext,
) -> Result<()> {
    let key = record.record_key.trim();
    if key.is_empty() {
        return Err(Error::InvalidInput("record_key must not be empty".to_string()));
    }
    let now = now_iso();
    let mut tx = pool.begin().await?;
    let outcome = upsert_record(&mut tx, record, &now).await?;
    if outcome == UpsertOutcome::Updated {
        tx.rollback().await?;
        return Err(Error::InvalidInput(format!("record already exists: {key}")));
    }
    log_activity(&mut tx, key, "created", &ctx.actor, "", &now).await?;
    tx.commit().await?;
    Ok(())
}

/// Interactive update: overwrite plus an "updated" audit entry
pub async fn update_record(
    pool: &SqlitePool,
    record_key: &str,
    record: &TrackedRecord,
    ctx: &RequestContext,
) -> Result<()> {
    let now = now_iso();
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE tracker_records SET
            report_date = ?, site_id = ?, site_name = ?, region = ?,
            metric_name = ?, value = ?, status = ?, notes = ?, updated_at = ?
        WHERE record_key = ?
        "#,
    )
    .bind(&record.report_date)
    .bind(&record.site_id)
    .bind(record.site_name.as_deref().unwrap_or(""))
    .bind(&record.region)
    .bind(&record.metric_name)
    .bind(record.value)
    .bind(record.status.as_deref().unwrap_or(""))
    .bind(record.notes.as_deref().unwrap_or(""))
    .bind(&now)
    .bind(record_key)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(Error::NotFound(format!("record: {record_key}")));
    }
    log_activity(&mut tx, record_key, "updated", &ctx.actor, "", &now).await?;
    tx.commit().await?;
    Ok(())
}

/// Delete a record. Audit entries for the key are retained on purpose.
pub async fn delete_record(pool: &SqlitePool, record_key: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tracker_records WHERE record_key = ?")
        .bind(record_key)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("record: {record_key}")));
    }
    Ok(())
}

pub async fn get_record(pool: &SqlitePool, record_key: &str) -> Result<Option<TrackedRecord>> {
    let record = sqlx::query_as::<_, TrackedRecord>(
        "SELECT * FROM tracker_records WHERE record_key = ?",
    )
    .bind(record_key)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// All records, newest report date first
pub async fn list_records(pool: &SqlitePool) -> Result<Vec<TrackedRecord>> {
    let records = sqlx::query_as::<_, TrackedRecord>(
        "SELECT * FROM tracker_records ORDER BY report_date DESC, record_key",
    )
    .fetch_all(pool)
    .await?;
    Ok(records)
}

pub async fn count_records(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracker_records")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Records whose updated_at falls on today's UTC date
pub async fn count_updated_today(pool: &SqlitePool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tracker_records WHERE date(updated_at) = ?")
            .bind(today())
            .fetch_one(pool)
            .await?;
    Ok(count)
}
