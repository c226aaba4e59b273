//! Access layer: caller identity and allowlist enforcement
//!
//! Identity comes from the `X-Tracker-User` header; a request carrying
//! the configured developer key in `X-Developer-Key` gets developer
//! visibility regardless of the allowlist. When the allowlist is
//! enabled, unknown identifiers are refused before any handler runs.
//! The resolved RequestContext rides in request extensions.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use ktrk_common::config::RequestContext;
use ktrk_common::db::{add_allowed_user, is_user_allowed, list_allowed_users, remove_allowed_user};

use crate::api::ApiError;
use crate::AppState;

const USER_HEADER: &str = "x-tracker-user";
const DEVELOPER_HEADER: &str = "x-developer-key";

/// Access middleware applied to all /api routes
pub async fn access_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AccessError> {
    let actor = header_value(&request, USER_HEADER).unwrap_or_default();
    let developer = !state.config.developer_key.is_empty()
        && header_value(&request, DEVELOPER_HEADER).as_deref()
            == Some(state.config.developer_key.as_str());

    if state.config.allowlist_enabled && !developer {
        let allowed = is_user_allowed(&state.db, &state.config.allowlist_ids, &actor)
            .await
            .map_err(|e| AccessError::Internal(e.to_string()))?;
        if !allowed {
            warn!(actor = %actor, "access refused");
            return Err(AccessError::Forbidden);
        }
    }

    let mut ctx = RequestContext::new(actor);
    ctx.developer = developer;
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Access layer errors
#[derive(Debug)]
pub enum AccessError {
    Forbidden,
    Internal(String),
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AccessError::Forbidden => (
                StatusCode::FORBIDDEN,
                "identifier is not on the access list".to_string(),
            ),
            AccessError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Access check failed: {}", msg))
            }
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub identifier: String,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users = list_allowed_users(&state.db).await?;
    Ok(Json(json!({ "users": users })))
}

/// POST /api/users
pub async fn add_user(
    State(state): State<AppState>,
    Json(req): Json<AddUserRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let added = add_allowed_user(&state.db, &req.identifier).await?;
    Ok(Json(json!({ "added": added })))
}

/// DELETE /api/users/:identifier
pub async fn remove_user(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = remove_allowed_user(&state.db, &identifier).await?;
    Ok(Json(json!({ "removed": removed })))
}
