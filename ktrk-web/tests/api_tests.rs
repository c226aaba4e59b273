//! Integration tests for the ktrk-web API
//!
//! Each test builds the full router over an in-memory database, so
//! routing, the access layer, and handler logic are exercised together.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

use ktrk_common::config::TrackerConfig;
use ktrk_common::db::{init_memory_database, replace_tab};
use ktrk_common::Row;
use ktrk_web::{build_router, AppState};

async fn setup_db() -> SqlitePool {
    init_memory_database().await.expect("in-memory database")
}

fn setup_app(db: SqlitePool, config: TrackerConfig) -> Router {
    build_router(AppState::new(db, config))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Tracker-User", user)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, user: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Tracker-User", user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn sample_record(key: &str) -> Value {
    json!({
        "record_key": key,
        "report_date": "2024-06-01",
        "site_id": "S1",
        "site_name": "Site One",
        "region": "KSA",
        "metric_name": "Occupancy",
        "value": 80.0,
        "status": "Confirmed",
        "notes": ""
    })
}

#[tokio::test]
async fn test_health_requires_no_identity() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ktrk-web");
}

#[tokio::test]
async fn test_record_crud_round_trip() {
    let app = setup_app(setup_db().await, TrackerConfig::default());

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/records", "ops", &sample_record("R1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_as("/api/records/R1", "ops"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["region"], "KSA");
    assert_eq!(body["value"], 80.0);

    let mut updated = sample_record("R1");
    updated["status"] = json!("Churned");
    let response = app
        .clone()
        .oneshot(send_json("PUT", "/api/records/R1", "ops", &updated))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Audit trail has the create and the update, attributed to the actor
    let response = app
        .clone()
        .oneshot(get_as("/api/records/R1/activity", "ops"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let actions: Vec<&str> = body["activity"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"created"));
    assert!(actions.contains(&"updated"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/records/R1")
                .header("X-Tracker-User", "ops")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_as("/api/records/R1", "ops")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_create_rejected() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/records", "ops", &sample_record("R1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(send_json("POST", "/api/records", "ops", &sample_record("R1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_interactive_create_defaults_region() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    let mut record = sample_record("R1");
    record["region"] = json!("");
    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/records", "ops", &record))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_as("/api/records/R1", "ops")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["region"], "KSA");
}

#[tokio::test]
async fn test_allowlist_blocks_unknown_identity() {
    let mut config = TrackerConfig::default();
    config.allowlist_enabled = true;
    config.allowlist_ids = vec!["ops@example.com".to_string()];
    config.developer_key = "dev-secret".to_string();
    let app = setup_app(setup_db().await, config);

    let response = app
        .clone()
        .oneshot(get_as("/api/records", "stranger"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get_as("/api/records", "OPS@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Developer key bypasses the allowlist
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/records")
                .header("X-Developer-Key", "dev-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_tab_visibility_is_role_based() {
    let db = setup_db().await;
    replace_tab(&db, "SF Kitchen Data", &[Row::from([("a", "1")])])
        .await
        .unwrap();
    replace_tab(&db, "Pivot Table 10", &[Row::from([("b", "2")])])
        .await
        .unwrap();

    let mut config = TrackerConfig::default();
    config.super_user_ids = vec!["lead".to_string()];
    let app = setup_app(db, config);

    let response = app.clone().oneshot(get_as("/api/tabs", "viewer")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let tabs: Vec<&str> = body["tabs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert!(tabs.contains(&"SF Kitchen Data"));
    assert!(!tabs.contains(&"Pivot Table 10"));

    let response = app.clone().oneshot(get_as("/api/tabs", "lead")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let tabs: Vec<&str> = body["tabs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert!(tabs.contains(&"Pivot Table 10"));
    assert!(tabs.contains(&"SF Kitchen Data"));

    // Non-kitchen tab is invisible to regular callers
    let response = app
        .oneshot(get_as("/api/tabs/Pivot%20Table%2010", "viewer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_tab_search() {
    let db = setup_db().await;
    replace_tab(
        &db,
        "SF Kitchen Data",
        &[
            Row::from([("site", "Riyadh North"), ("status", "Open")]),
            Row::from([("site", "Jeddah West"), ("status", "Closed")]),
        ],
    )
    .await
    .unwrap();
    let app = setup_app(db, TrackerConfig::default());

    let response = app
        .oneshot(get_as("/api/tabs/search?q=riyadh", "viewer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["tabs"][0]["tab_id"], "SF Kitchen Data");
}

#[tokio::test]
async fn test_export_uses_canonical_column_order() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    app.clone()
        .oneshot(send_json("POST", "/api/records", "ops", &sample_record("R1")))
        .await
        .unwrap();

    let response = app
        .oneshot(get_as("/api/records/export", "ops"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.starts_with(
        "record_key,report_date,site_id,site_name,region,metric_name,value,status,notes"
    ));
    assert!(body.contains("R1,2024-06-01,S1"));
}

#[tokio::test]
async fn test_refresh_status_reports_due_when_never_run() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    let response = app
        .oneshot(get_as("/api/refresh/status", "ops"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["due"], true);
    assert!(body["last_refresh"].is_null());
}

#[tokio::test]
async fn test_comments_and_discussions() {
    let app = setup_app(setup_db().await, TrackerConfig::default());

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/records/R1/comments",
            "ops",
            &json!({ "body": "checking on this" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_as("/api/records/R1/comments", "ops"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["comments"][0]["author"], "ops");
    assert_eq!(body["comments"][0]["body"], "checking on this");

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/discussions",
            "",
            &json!({ "message": "hello" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_as("/api/discussions", "ops")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["posts"][0]["author"], "Anonymous");
}

#[tokio::test]
async fn test_feedback_round_trip() {
    let app = setup_app(setup_db().await, TrackerConfig::default());

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/feedback",
            "ops",
            &json!({ "message": "summary page needs a region filter", "page": "/report" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_as("/api/feedback", "ops")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["feedback"][0]["author"], "ops");
    assert_eq!(body["feedback"][0]["message"], "summary page needs a region filter");
    assert_eq!(body["feedback"][0]["page"], "/report");
}

#[tokio::test]
async fn test_saved_views_and_templates() {
    let app = setup_app(setup_db().await, TrackerConfig::default());

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/views",
            "ops",
            &json!({ "name": "KSA only", "filters": { "region": "KSA" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.clone().oneshot(get_as("/api/views", "ops")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["views"][0]["name"], "KSA only");

    // Blank name is rejected
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/templates",
            "ops",
            &json!({ "name": " ", "data": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_report_renders_counts() {
    let app = setup_app(setup_db().await, TrackerConfig::default());
    app.clone()
        .oneshot(send_json("POST", "/api/records", "ops", &sample_record("R1")))
        .await
        .unwrap();

    let response = app.oneshot(get_as("/api/report", "ops")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Total records: 1"));
    assert!(html.contains("<td>KSA</td><td>1</td>"));
    assert!(html.contains("<td>Occupancy</td><td>1</td>"));
}
