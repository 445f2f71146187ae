//! Ingestion validation
//!
//! Normalizes a raw submission payload into a [`NewSubmission`] before it
//! reaches the store. Validation runs to completion before any write, so
//! a rejected payload never leaves a partial record behind.

use serde::Deserialize;

use crate::model::NewSubmission;
use crate::ValidationError;

/// Raw submission payload as reported by a CI pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageUpload {
    pub project_name: Option<String>,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
    /// Build duration in milliseconds.
    pub duration: Option<i64>,
    pub summary: Option<UploadSummary>,
}

/// The four required metric groups plus optional test totals.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub statements: Option<MetricGroup>,
    pub branches: Option<MetricGroup>,
    pub functions: Option<MetricGroup>,
    pub lines: Option<MetricGroup>,
    pub tests: Option<TestTotals>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricGroup {
    pub pct: Option<f64>,
    pub covered: Option<i64>,
    pub total: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestTotals {
    pub total: Option<i64>,
    pub passed: Option<i64>,
    pub failed: Option<i64>,
}

/// Validates and normalizes a raw payload.
///
/// Rejects a missing or blank `projectName` and any absent metric group
/// or missing percentage. Applies defaults: `branch` falls back to
/// `"main"`, `commitHash` to `"unknown"`, `duration` and test counts
/// to 0. The relation `total = passed + failed` is not enforced.
pub fn validate(upload: CoverageUpload) -> Result<NewSubmission, ValidationError> {
    let project_name = upload
        .project_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ValidationError::MissingField("projectName"))?
        .to_string();

    let summary = upload
        .summary
        .ok_or_else(|| ValidationError::MalformedSubmission("summary".to_string()))?;

    let statements_coverage = require_pct(summary.statements, "statements")?;
    let branches_coverage = require_pct(summary.branches, "branches")?;
    let functions_coverage = require_pct(summary.functions, "functions")?;
    let lines_coverage = require_pct(summary.lines, "lines")?;

    let tests = summary.tests.unwrap_or_default();

    Ok(NewSubmission {
        project_name,
        branch: defaulted(upload.branch, "main"),
        commit_hash: defaulted(upload.commit_hash, "unknown"),
        statements_coverage,
        branches_coverage,
        functions_coverage,
        lines_coverage,
        total_tests: tests.total.unwrap_or(0),
        passed_tests: tests.passed.unwrap_or(0),
        failed_tests: tests.failed.unwrap_or(0),
        duration: upload.duration.unwrap_or(0),
    })
}

fn require_pct(group: Option<MetricGroup>, name: &str) -> Result<f64, ValidationError> {
    group
        .and_then(|g| g.pct)
        .ok_or_else(|| ValidationError::MalformedSubmission(format!("summary.{name}.pct")))
}

fn defaulted(value: Option<String>, fallback: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
