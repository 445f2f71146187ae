//! Aggregation engine
//!
//! Read-only queries over a snapshot of the record store: latest per
//! project, history, windowed summaries and day-bucketed trends. The
//! engine never mutates the store.
//!
//! "Latest" always means maximal `(created_at, id)`. Selecting by
//! timestamp equality alone can return several rows per project when
//! two records share a timestamp, so every group is reduced with the
//! composite key instead.
//!
//! Day buckets are fixed to UTC so trend boundaries are deterministic
//! regardless of where the service or its database runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::ingest::{self, CoverageUpload};
use crate::model::{CoverageRecord, ProjectSummary, TrendPoint};
use crate::store::RecordStore;
use crate::{CoreError, CoreResult, ValidationError};

/// Default trailing window for the cross-project summary, in days.
pub const DEFAULT_SUMMARY_WINDOW_DAYS: i64 = 90;

/// Outcome of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSubmission {
    pub id: i64,
    pub project: String,
}

/// Coordinates the ingestion validator and the aggregation queries over
/// a shared record store. Holds no state of its own.
#[derive(Clone)]
pub struct CoverageService {
    store: Arc<dyn RecordStore>,
}

impl CoverageService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Validates a raw payload and appends it. Validation completes
    /// before the store is touched, so a rejected payload writes nothing.
    pub async fn submit(&self, upload: CoverageUpload) -> CoreResult<AcceptedSubmission> {
        let submission = ingest::validate(upload)?;
        let project = submission.project_name.clone();
        let id = self.store.append(submission).await?;
        debug!(project = %project, id, "coverage submission recorded");
        Ok(AcceptedSubmission { id, project })
    }

    /// The single most recent record for a project.
    pub async fn latest(&self, project_name: &str) -> CoreResult<CoverageRecord> {
        let records = self.store.all_by_project(project_name).await?;
        latest_of(&records)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(project_name.to_string()))
    }

    /// All records for a project, newest first. An unknown project is an
    /// empty sequence, not an error.
    pub async fn history(&self, project_name: &str) -> CoreResult<Vec<CoverageRecord>> {
        self.store.all_by_project(project_name).await
    }

    /// One record per distinct project: the maximal `(created_at, id)`
    /// within each group, ordered by project name.
    pub async fn latest_per_project(&self) -> CoreResult<Vec<CoverageRecord>> {
        let records = self.store.all().await?;
        let mut winners: BTreeMap<String, CoverageRecord> = BTreeMap::new();
        for record in records {
            match winners.get(&record.project_name) {
                Some(current) if current.order_key() >= record.order_key() => {}
                _ => {
                    winners.insert(record.project_name.clone(), record);
                }
            }
        }
        Ok(winners.into_values().collect())
    }

    /// Averages over a project's records inside a trailing window.
    /// `NotFound` when the project has no activity in the window, even
    /// if it has older records.
    pub async fn summarize_window(
        &self,
        project_name: &str,
        window_days: i64,
    ) -> CoreResult<ProjectSummary> {
        let cutoff = window_cutoff(window_days)?;
        let records = self.store.all_by_project(project_name).await?;
        summarize(project_name, &records, Some(cutoff))
            .ok_or_else(|| CoreError::NotFound(project_name.to_string()))
    }

    /// Windowed summary for every project with activity in the window,
    /// ordered by project name. Inactive projects are omitted.
    pub async fn summarize_all_projects(&self, window_days: i64) -> CoreResult<Vec<ProjectSummary>> {
        let cutoff = window_cutoff(window_days)?;
        let groups = group_by_project(self.store.all().await?);
        Ok(groups
            .iter()
            .filter_map(|(name, records)| summarize(name, records, Some(cutoff)))
            .collect())
    }

    /// Unwindowed per-project averages. The run count is deliberately
    /// absent from this shape and pinned to zero here; callers that need
    /// it use [`summarize_all_projects`](Self::summarize_all_projects).
    pub async fn summarize_all_unwindowed(&self) -> CoreResult<Vec<ProjectSummary>> {
        let groups = group_by_project(self.store.all().await?);
        Ok(groups
            .iter()
            .filter_map(|(name, records)| summarize(name, records, None))
            .map(|mut summary| {
                summary.total_runs = 0;
                summary
            })
            .collect())
    }

    /// Daily averages for a project over a trailing window, ascending by
    /// date. Days with no submissions emit no point.
    pub async fn trend(&self, project_name: &str, days: i64) -> CoreResult<Vec<TrendPoint>> {
        let cutoff = window_cutoff(days)?;
        let records = self.store.all_by_project(project_name).await?;
        Ok(trend_points(&records, cutoff))
    }
}

/// Start of a trailing window. `days` arrives straight from callers, so
/// values chrono cannot represent are rejected instead of panicking in
/// the subtraction.
fn window_cutoff(days: i64) -> Result<DateTime<Utc>, ValidationError> {
    Duration::try_days(days)
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .ok_or(ValidationError::InvalidWindow(days))
}

fn group_by_project(records: Vec<CoverageRecord>) -> BTreeMap<String, Vec<CoverageRecord>> {
    let mut groups: BTreeMap<String, Vec<CoverageRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.project_name.clone()).or_default().push(record);
    }
    groups
}

fn latest_of(records: &[CoverageRecord]) -> Option<&CoverageRecord> {
    records.iter().max_by_key(|r| r.order_key())
}

/// Unweighted means over the records at or after `cutoff` (all records
/// when `cutoff` is `None`). `None` when nothing qualifies. The window
/// boundary is inclusive.
fn summarize(
    project_name: &str,
    records: &[CoverageRecord],
    cutoff: Option<DateTime<Utc>>,
) -> Option<ProjectSummary> {
    let in_window: Vec<&CoverageRecord> = records
        .iter()
        .filter(|r| cutoff.map_or(true, |c| r.created_at >= c))
        .collect();
    let count = in_window.len();
    if count == 0 {
        return None;
    }

    let mut statements = 0.0;
    let mut branches = 0.0;
    let mut functions = 0.0;
    let mut lines = 0.0;
    let mut last_updated = in_window[0].created_at;
    for record in &in_window {
        statements += record.statements_coverage;
        branches += record.branches_coverage;
        functions += record.functions_coverage;
        lines += record.lines_coverage;
        last_updated = last_updated.max(record.created_at);
    }

    let n = count as f64;
    Some(ProjectSummary {
        project_name: project_name.to_string(),
        avg_statements: statements / n,
        avg_branches: branches / n,
        avg_functions: functions / n,
        avg_lines: lines / n,
        last_updated,
        total_runs: count as i64,
    })
}

/// Buckets records at or after `cutoff` by UTC calendar day and averages
/// each non-empty bucket. The `BTreeMap` keys come out ascending.
fn trend_points(records: &[CoverageRecord], cutoff: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<chrono::NaiveDate, Vec<&CoverageRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.created_at >= cutoff) {
        buckets
            .entry(record.created_at.date_naive())
            .or_default()
            .push(record);
    }

    buckets
        .into_iter()
        .map(|(date, day)| {
            let n = day.len() as f64;
            TrendPoint {
                date,
                avg_statements: day.iter().map(|r| r.statements_coverage).sum::<f64>() / n,
                avg_branches: day.iter().map(|r| r.branches_coverage).sum::<f64>() / n,
                avg_functions: day.iter().map(|r| r.functions_coverage).sum::<f64>() / n,
                avg_lines: day.iter().map(|r| r.lines_coverage).sum::<f64>() / n,
            }
        })
        .collect()
}
