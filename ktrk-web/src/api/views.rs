//! Saved filter views and input templates

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use ktrk_common::db;
use ktrk_common::Error;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveViewRequest {
    pub name: String,
    pub filters: serde_json::Value,
}

/// GET /api/views
pub async fn list_views(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let views = db::list_saved_views(&state.db).await?;
    Ok(Json(json!({ "views": views })))
}

/// POST /api/views
pub async fn save_view(
    State(state): State<AppState>,
    Json(req): Json<SaveViewRequest>,
) -> Result<StatusCode, ApiError> {
    db::save_saved_view(&state.db, &req.name, &req.filters).await?;
    Ok(StatusCode::CREATED)
}

/// GET /api/views/:id
pub async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<db::SavedView>, ApiError> {
    let view = db::get_saved_view(&state.db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("saved view: {id}")))?;
    Ok(Json(view))
}

/// DELETE /api/views/:id
pub async fn delete_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::delete_saved_view(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
    /// Field defaults preloaded into the entry form
    pub data: serde_json::Value,
}

/// GET /api/templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let templates = db::list_templates(&state.db).await?;
    Ok(Json(json!({ "templates": templates })))
}

/// POST /api/templates
pub async fn save_template(
    State(state): State<AppState>,
    Json(req): Json<SaveTemplateRequest>,
) -> Result<StatusCode, ApiError> {
    db::save_template(&state.db, &req.name, &req.data).await?;
    Ok(StatusCode::CREATED)
}

/// GET /api/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<db::Template>, ApiError> {
    let template = db::get_template(&state.db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("template: {id}")))?;
    Ok(Json(template))
}

/// DELETE /api/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::delete_template(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id })))
}
