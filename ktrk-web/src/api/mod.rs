//! HTTP API handlers for ktrk-web

pub mod access;
pub mod health;
pub mod records;
pub mod refresh;
pub mod report;
pub mod social;
pub mod tabs;
pub mod views;

pub use access::access_middleware;
pub use health::health_routes;
pub use records::{
    create_record, delete_record, export_records, get_record, list_records, update_record,
};
pub use refresh::{refresh_status, run_refresh};
pub use report::summary_report;
pub use social::{
    add_comment, list_comments, list_discussions, list_feedback, post_discussion, post_feedback,
    recent_activity, record_activity,
};
pub use tabs::{get_tab, list_tabs, search_tabs};
pub use views::{
    delete_template, delete_view, get_template, get_view, list_templates, list_views,
    save_template, save_view,
};
pub use access::{add_user, list_users, remove_user};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Handler-facing error wrapper mapping domain errors to HTTP statuses
#[derive(Debug)]
pub struct ApiError(pub ktrk_common::Error);

impl From<ktrk_common::Error> for ApiError {
    fn from(e: ktrk_common::Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ktrk_common::Error;
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Source(_) | Error::Payload(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
