//! Tracker record CRUD and export
//!
//! Interactive edits write one audit entry per change, attributed to
//! the request actor. The list endpoint filters in memory; the data set
//! is a single operational tracker, not a warehouse.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use ktrk_common::config::RequestContext;
use ktrk_common::db::{self, TrackedRecord};
use ktrk_common::Error;

use crate::api::ApiError;
use crate::AppState;

/// Query parameters for the record list
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub region: Option<String>,
    pub metric_name: Option<String>,
    pub status: Option<String>,
    pub site_id: Option<String>,
    /// Case-insensitive substring match across all record fields
    pub search: Option<String>,
}

/// GET /api/records
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = db::list_records(&state.db).await?;
    let records = apply_filters(records, &query);
    Ok(Json(json!({
        "count": records.len(),
        "records": records,
    })))
}

/// GET /api/records/:key
pub async fn get_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TrackedRecord>, ApiError> {
    let record = db::get_record(&state.db, &key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("record: {key}")))?;
    Ok(Json(record))
}

/// POST /api/records
pub async fn create_record(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(record): Json<TrackedRecord>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let record = with_region_default(record);
    db::insert_record(&state.db, &record, &ctx).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "record_key": record.record_key })),
    ))
}

/// PUT /api/records/:key
pub async fn update_record(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(key): Path<String>,
    Json(record): Json<TrackedRecord>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = with_region_default(record);
    db::update_record(&state.db, &key, &record, &ctx).await?;
    Ok(Json(json!({ "record_key": key })))
}

/// DELETE /api/records/:key
///
/// Audit entries for the key survive the delete.
pub async fn delete_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::delete_record(&state.db, &key).await?;
    Ok(Json(json!({ "deleted": key })))
}

/// GET /api/records/export
///
/// CSV download in the standardized column order, honoring the same
/// filters as the list endpoint.
pub async fn export_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, ApiError> {
    let records = db::list_records(&state.db).await?;
    let records = apply_filters(records, &query);
    let body = render_csv(&records).map_err(ApiError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tracker_export.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

/// The interactive default for a blank region; batch loads never apply it.
fn with_region_default(mut record: TrackedRecord) -> TrackedRecord {
    if record.region.trim().is_empty() {
        record.region = "KSA".to_string();
    }
    record
}

fn apply_filters(records: Vec<TrackedRecord>, query: &RecordQuery) -> Vec<TrackedRecord> {
    records
        .into_iter()
        .filter(|r| field_matches(&r.region, &query.region))
        .filter(|r| field_matches(&r.metric_name, &query.metric_name))
        .filter(|r| field_matches(r.status.as_deref().unwrap_or(""), &query.status))
        .filter(|r| field_matches(&r.site_id, &query.site_id))
        .filter(|r| match &query.search {
            Some(needle) if !needle.trim().is_empty() => {
                r.to_export_row().matches(needle.trim())
            }
            _ => true,
        })
        .collect()
}

fn field_matches(value: &str, wanted: &Option<String>) -> bool {
    match wanted {
        Some(w) if !w.trim().is_empty() => value.trim().eq_ignore_ascii_case(w.trim()),
        _ => true,
    }
}

fn render_csv(records: &[TrackedRecord]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut wrote_header = false;
    for record in records {
        let row = record.to_export_row();
        if !wrote_header {
            writer
                .write_record(row.keys())
                .map_err(|e| Error::Internal(e.to_string()))?;
            wrote_header = true;
        }
        writer
            .write_record(row.iter().map(|(_, v)| v))
            .map_err(|e| Error::Internal(e.to_string()))?;
    }
    if !wrote_header {
        writer
            .write_record(ktrk_common::normalize::CANONICAL_FIELDS)
            .map_err(|e| Error::Internal(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(e.to_string()))
}
