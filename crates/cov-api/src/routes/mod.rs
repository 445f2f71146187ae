//! API routes

pub mod coverage;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cov_core::CoreError;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::AppState;

/// Builds the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Coverage submissions and queries
        .route("/api/coverage", post(coverage::submit_coverage))
        .route("/api/coverage/projects/summary", get(coverage::get_project_summaries))
        .route("/api/coverage/projects", get(coverage::get_latest_per_project))
        .route("/api/coverage/summary", get(coverage::get_unwindowed_summary))
        .route("/api/coverage/project/:project_name", get(coverage::get_history))
        .route("/api/coverage/project/:project_name/latest", get(coverage::get_latest))
        .route("/api/coverage/project/:project_name/trend", get(coverage::get_trend))

        // CORS
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))

        // Tracing
        .layer(TraceLayer::new_for_http())

        // State
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Maps core failures onto HTTP responses with a JSON error body.
/// Validation problems are the client's fault, absent data is 404, and
/// anything else is logged and reported generically.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::Validation(cause) => (StatusCode::BAD_REQUEST, cause.to_string()),
            CoreError::NotFound(project) => (
                StatusCode::NOT_FOUND,
                format!("No coverage data found for project: {project}"),
            ),
            CoreError::Internal(cause) => {
                error!(%cause, "coverage request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process coverage request".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
