//! Generic tab snapshots
//!
//! Tabs other than the canonical tracker are opaque row sets replaced
//! wholesale on refresh. Visibility is role-based: regular callers see
//! the configured kitchen tabs, super users and developers see all.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use ktrk_common::config::RequestContext;
use ktrk_common::db::{list_tab, list_tab_ids};
use ktrk_common::rows::Row;
use ktrk_common::Error;

use crate::api::ApiError;
use crate::AppState;

/// GET /api/tabs
///
/// The configured known tabs plus any extra tab ids discovered in the
/// store (ad hoc tabs created by loads keep showing up).
pub async fn list_tabs(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut ids = state.config.tabs.known_tabs.clone();
    for stored in list_tab_ids(&state.db).await? {
        let folded = stored.trim().to_lowercase();
        if !ids.iter().any(|k| k.trim().to_lowercase() == folded) {
            ids.push(stored);
        }
    }
    if !state.config.is_super_user(&ctx) {
        ids.retain(|id| is_kitchen_tab(&state, id));
    }
    Ok(Json(json!({ "tabs": ids })))
}

/// GET /api/tabs/:id
pub async fn get_tab(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_visible(&state, &ctx, &id)?;
    let rows = list_tab(&state.db, &id).await?;
    if rows.is_empty() {
        return Err(Error::NotFound(format!("tab: {id}")).into());
    }
    Ok(Json(json!({
        "tab_id": id,
        "count": rows.len(),
        "rows": rows,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/tabs/search?q=...
///
/// Case-insensitive substring search across every visible tab's rows.
pub async fn search_tabs(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let needle = query.q.trim();
    if needle.is_empty() {
        return Err(Error::InvalidInput("search term must not be empty".to_string()).into());
    }

    let mut ids = list_tab_ids(&state.db).await?;
    if !state.config.is_super_user(&ctx) {
        ids.retain(|id| is_kitchen_tab(&state, id));
    }

    let mut hits = Vec::new();
    let mut total = 0usize;
    for id in ids {
        let rows = list_tab(&state.db, &id).await?;
        let matching: Vec<Row> = rows.into_iter().filter(|r| r.matches(needle)).collect();
        if !matching.is_empty() {
            total += matching.len();
            hits.push(json!({
                "tab_id": id,
                "count": matching.len(),
                "rows": matching,
            }));
        }
    }

    Ok(Json(json!({
        "query": needle,
        "total": total,
        "tabs": hits,
    })))
}

fn ensure_visible(state: &AppState, ctx: &RequestContext, id: &str) -> Result<(), ApiError> {
    if state.config.is_super_user(ctx) || is_kitchen_tab(state, id) {
        Ok(())
    } else {
        Err(Error::NotFound(format!("tab: {id}")).into())
    }
}

fn is_kitchen_tab(state: &AppState, id: &str) -> bool {
    let folded = id.trim().to_lowercase();
    state
        .config
        .tabs
        .kitchen_tabs
        .iter()
        .any(|k| k.trim().to_lowercase() == folded)
}
