//! ktrk-web library - Tracker dashboard service
//!
//! HTTP API over the tracker database: record CRUD with audit, generic
//! tab snapshots, source refresh, saved views, comments/discussions,
//! and a summary report. Every data route runs behind the access layer;
//! only /health is public.

use axum::Router;
use sqlx::SqlitePool;

use ktrk_common::config::TrackerConfig;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration (access, tabs, sources, refresh cadence)
    pub config: TrackerConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, config: TrackerConfig) -> Self {
        Self { db, config }
    }
}

/// Build application router
///
/// /health is public; everything else passes the access middleware,
/// which resolves the caller identity and enforces the allowlist.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    let protected = Router::new()
        .route("/api/records", get(api::list_records).post(api::create_record))
        .route("/api/records/export", get(api::export_records))
        .route(
            "/api/records/:key",
            get(api::get_record).put(api::update_record).delete(api::delete_record),
        )
        .route(
            "/api/records/:key/comments",
            get(api::list_comments).post(api::add_comment),
        )
        .route("/api/records/:key/activity", get(api::record_activity))
        .route("/api/activity", get(api::recent_activity))
        .route("/api/discussions", get(api::list_discussions).post(api::post_discussion))
        .route("/api/feedback", get(api::list_feedback).post(api::post_feedback))
        .route("/api/tabs", get(api::list_tabs))
        .route("/api/tabs/search", get(api::search_tabs))
        .route("/api/tabs/:id", get(api::get_tab))
        .route("/api/refresh", post(api::run_refresh))
        .route("/api/refresh/status", get(api::refresh_status))
        .route("/api/views", get(api::list_views).post(api::save_view))
        .route("/api/views/:id", get(api::get_view).delete(api::delete_view))
        .route("/api/templates", get(api::list_templates).post(api::save_template))
        .route(
            "/api/templates/:id",
            get(api::get_template).delete(api::delete_template),
        )
        .route("/api/users", get(api::list_users).post(api::add_user))
        .route("/api/users/:identifier", delete(api::remove_user))
        .route("/api/report", get(api::summary_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::access_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
