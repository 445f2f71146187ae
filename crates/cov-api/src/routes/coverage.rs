//! Coverage submission and query routes

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use cov_core::engine::DEFAULT_SUMMARY_WINDOW_DAYS;
use cov_core::model::local_timestamp;
use cov_core::{CoverageRecord, CoverageUpload, ProjectSummary, TrendPoint};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

const DEFAULT_TREND_DAYS: i64 = 30;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub id: i64,
    pub project: String,
}

#[derive(Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}

/// Unwindowed summary shape: per-project averages and last update,
/// deliberately without a run count.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCoverageResponse {
    pub project_name: String,
    pub avg_statements: f64,
    pub avg_branches: f64,
    pub avg_functions: f64,
    pub avg_lines: f64,
    #[serde(with = "local_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl From<ProjectSummary> for ProjectCoverageResponse {
    fn from(summary: ProjectSummary) -> Self {
        Self {
            project_name: summary.project_name,
            avg_statements: summary.avg_statements,
            avg_branches: summary.avg_branches,
            avg_functions: summary.avg_functions,
            avg_lines: summary.avg_lines,
            last_updated: summary.last_updated,
        }
    }
}

pub async fn submit_coverage(
    State(state): State<Arc<AppState>>,
    Json(upload): Json<CoverageUpload>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let accepted = state.service.submit(upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Coverage results saved successfully".to_string(),
            id: accepted.id,
            project: accepted.project,
        }),
    ))
}

pub async fn get_project_summaries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let summaries = state
        .service
        .summarize_all_projects(DEFAULT_SUMMARY_WINDOW_DAYS)
        .await?;
    Ok(Json(summaries))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(project_name): Path<String>,
) -> Result<Json<Vec<CoverageRecord>>, ApiError> {
    let records = state.service.history(&project_name).await?;
    Ok(Json(records))
}

pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    Path(project_name): Path<String>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let points = state.service.trend(&project_name, days).await?;
    Ok(Json(points))
}

pub async fn get_unwindowed_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectCoverageResponse>>, ApiError> {
    let summaries = state.service.summarize_all_unwindowed().await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

pub async fn get_latest_per_project(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CoverageRecord>>, ApiError> {
    let records = state.service.latest_per_project().await?;
    Ok(Json(records))
}

pub async fn get_latest(
    State(state): State<Arc<AppState>>,
    Path(project_name): Path<String>,
) -> Result<Json<CoverageRecord>, ApiError> {
    let record = state.service.latest(&project_name).await?;
    Ok(Json(record))
}
