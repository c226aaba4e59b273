//! Comments, discussions, feedback, and the activity feed

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use ktrk_common::config::RequestContext;
use ktrk_common::db;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
    /// Falls back to the request actor, then "Anonymous"
    #[serde(default)]
    pub author: Option<String>,
}

/// GET /api/records/:key/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let comments = db::list_comments(&state.db, &key).await?;
    Ok(Json(json!({ "record_key": key, "comments": comments })))
}

/// POST /api/records/:key/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(key): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<StatusCode, ApiError> {
    let author = req.author.unwrap_or_else(|| ctx.actor.clone());
    db::add_comment(&state.db, &key, &author, &req.body).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct DiscussionRequest {
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Set to reply to an existing post
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/discussions
pub async fn list_discussions(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let posts = db::list_discussions(&state.db, query.limit).await?;
    Ok(Json(json!({ "posts": posts })))
}

/// POST /api/discussions
pub async fn post_discussion(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<DiscussionRequest>,
) -> Result<StatusCode, ApiError> {
    let author = req.author.unwrap_or_else(|| ctx.actor.clone());
    db::insert_discussion(&state.db, &author, &req.message, req.parent_id).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Dashboard page the feedback was sent from
    #[serde(default)]
    pub page: Option<String>,
}

/// GET /api/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries = db::list_feedback(&state.db, query.limit).await?;
    Ok(Json(json!({ "feedback": entries })))
}

/// POST /api/feedback
pub async fn post_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<FeedbackRequest>,
) -> Result<StatusCode, ApiError> {
    let author = req.author.unwrap_or_else(|| ctx.actor.clone());
    db::insert_feedback(&state.db, &author, &req.message, req.page.as_deref()).await?;
    Ok(StatusCode::CREATED)
}

/// GET /api/records/:key/activity
pub async fn record_activity(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries = db::list_record_activity(&state.db, &key).await?;
    Ok(Json(json!({ "record_key": key, "activity": entries })))
}

/// GET /api/activity
pub async fn recent_activity(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries = db::list_recent_activity(&state.db, query.limit).await?;
    Ok(Json(json!({ "activity": entries })))
}
