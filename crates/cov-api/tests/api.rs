//! End-to-end tests for the coverage API, driving the router directly
//! over an in-memory record store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cov_api::{routes, AppConfig, AppState};
use cov_core::{CoverageService, MemStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let service = CoverageService::new(Arc::new(MemStore::new()));
    let state = Arc::new(AppState {
        service,
        config: AppConfig::default(),
    });
    routes::app(state)
}

fn payload(project: &str, statements: f64) -> Value {
    json!({
        "projectName": project,
        "branch": "main",
        "commitHash": "abc123",
        "duration": 900,
        "summary": {
            "statements": { "pct": statements },
            "branches": { "pct": 64.0 },
            "functions": { "pct": 72.0 },
            "lines": { "pct": 88.0 },
            "tests": { "total": 10, "passed": 10, "failed": 0 }
        }
    })
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    into_json(response).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    into_json(response).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_submit_then_query_flow() {
    let app = test_app();

    let (status, body) = post_json(&app, "/api/coverage", payload("  api  ", 81.0)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"], "api");
    assert_eq!(body["message"], "Coverage results saved successfully");
    let id = body["id"].as_i64().unwrap();

    let (status, body) = get_json(&app, "/api/coverage/project/api/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["statementsCoverage"], 81.0);

    let (status, body) = get_json(&app, "/api/coverage/project/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // createdAt uses the plain yyyy-MM-ddTHH:mm:ss shape, no offset
    let created_at = body[0]["createdAt"].as_str().unwrap();
    assert_eq!(created_at.len(), 19);
    assert_eq!(created_at.as_bytes()[10], b'T');
    assert!(!created_at.ends_with('Z'));
}

#[tokio::test]
async fn test_blank_project_name_is_a_client_error() {
    let app = test_app();
    let (status, body) = post_json(&app, "/api/coverage", payload("   ", 50.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("projectName"));

    // nothing was persisted
    let (_, body) = get_json(&app, "/api/coverage/projects").await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_metric_group_is_a_client_error() {
    let app = test_app();
    let mut bad = payload("api", 50.0);
    bad["summary"].as_object_mut().unwrap().remove("functions");

    let (status, body) = post_json(&app, "/api/coverage", bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("summary.functions.pct"));
}

#[tokio::test]
async fn test_latest_for_unknown_project_is_not_found() {
    let app = test_app();
    let (status, body) = get_json(&app, "/api/coverage/project/ghost/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "No coverage data found for project: ghost"
    );
}

#[tokio::test]
async fn test_history_for_unknown_project_is_empty_ok() {
    let app = test_app();
    let (status, body) = get_json(&app, "/api/coverage/project/ghost").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_shapes_differ_in_run_count() {
    let app = test_app();
    post_json(&app, "/api/coverage", payload("api", 80.0)).await;
    post_json(&app, "/api/coverage", payload("api", 90.0)).await;

    let (status, body) = get_json(&app, "/api/coverage/projects/summary").await;
    assert_eq!(status, StatusCode::OK);
    let windowed = &body.as_array().unwrap()[0];
    assert_eq!(windowed["projectName"], "api");
    assert_eq!(windowed["avgStatements"], 85.0);
    assert_eq!(windowed["totalRuns"], 2);

    let (status, body) = get_json(&app, "/api/coverage/summary").await;
    assert_eq!(status, StatusCode::OK);
    let unwindowed = &body.as_array().unwrap()[0];
    assert_eq!(unwindowed["avgStatements"], 85.0);
    assert!(unwindowed.get("totalRuns").is_none());
    assert!(unwindowed.get("lastUpdated").is_some());
}

#[tokio::test]
async fn test_latest_per_project_snapshot() {
    let app = test_app();
    post_json(&app, "/api/coverage", payload("alpha", 70.0)).await;
    post_json(&app, "/api/coverage", payload("alpha", 75.0)).await;
    post_json(&app, "/api/coverage", payload("beta", 60.0)).await;

    let (status, body) = get_json(&app, "/api/coverage/projects").await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["projectName"], "alpha");
    assert_eq!(records[0]["statementsCoverage"], 75.0);
    assert_eq!(records[1]["projectName"], "beta");
}

#[tokio::test]
async fn test_trend_defaults_and_buckets() {
    let app = test_app();
    post_json(&app, "/api/coverage", payload("api", 80.0)).await;
    post_json(&app, "/api/coverage", payload("api", 90.0)).await;

    // default 30-day window
    let (status, body) = get_json(&app, "/api/coverage/project/api/trend").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["avgStatements"], 85.0);
    assert!(points[0]["date"].as_str().unwrap().len() == 10);

    // explicit days parameter
    let (status, body) = get_json(&app, "/api/coverage/project/api/trend?days=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // unknown project trends to an empty series, not an error
    let (status, body) = get_json(&app, "/api/coverage/project/ghost/trend").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_trend_with_absurd_days_is_a_client_error() {
    let app = test_app();
    post_json(&app, "/api/coverage", payload("api", 80.0)).await;

    for days in ["9223372036854775807", "100000000"] {
        let uri = format!("/api/coverage/project/api/trend?days={days}");
        let (status, body) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid window"));
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
