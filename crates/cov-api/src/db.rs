//! SQLite-backed record store
//!
//! Implements the `cov-core` [`RecordStore`] contract on a SQLite pool.
//! Appends are single atomic inserts and every query is one statement,
//! so readers always observe a consistent snapshot.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text (microsecond
//! precision, `Z` suffix), which makes lexicographic `ORDER BY` agree
//! with chronological order.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use cov_core::{CoreError, CoreResult, CoverageRecord, NewSubmission, RecordStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS coverage_results (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    project_name        TEXT NOT NULL,
    branch              TEXT NOT NULL,
    commit_hash         TEXT NOT NULL,
    statements_coverage REAL NOT NULL,
    branches_coverage   REAL NOT NULL,
    functions_coverage  REAL NOT NULL,
    lines_coverage      REAL NOT NULL,
    total_tests         INTEGER NOT NULL,
    passed_tests        INTEGER NOT NULL,
    failed_tests        INTEGER NOT NULL,
    duration            INTEGER NOT NULL,
    created_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_coverage_results_project_created
    ON coverage_results (project_name, created_at DESC, id DESC);
"#;

const COLUMNS: &str = "id, project_name, branch, commit_hash, \
    statements_coverage, branches_coverage, functions_coverage, lines_coverage, \
    total_tests, passed_tests, failed_tests, duration, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and ensures the
    /// schema exists.
    pub async fn connect(url: &str) -> CoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(internal)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(internal)?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(internal)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn append(&self, submission: NewSubmission) -> CoreResult<i64> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            "INSERT INTO coverage_results (project_name, branch, commit_hash, \
             statements_coverage, branches_coverage, functions_coverage, lines_coverage, \
             total_tests, passed_tests, failed_tests, duration, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.project_name)
        .bind(&submission.branch)
        .bind(&submission.commit_hash)
        .bind(submission.statements_coverage)
        .bind(submission.branches_coverage)
        .bind(submission.functions_coverage)
        .bind(submission.lines_coverage)
        .bind(submission.total_tests)
        .bind(submission.passed_tests)
        .bind(submission.failed_tests)
        .bind(submission.duration)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        Ok(result.last_insert_rowid())
    }

    async fn all_by_project(&self, project_name: &str) -> CoreResult<Vec<CoverageRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM coverage_results WHERE project_name = ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(project_name)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn all(&self) -> CoreResult<Vec<CoverageRecord>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM coverage_results"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &SqliteRow) -> CoreResult<CoverageRecord> {
    let created_at: String = row.try_get("created_at").map_err(internal)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(internal)?
        .with_timezone(&Utc);

    Ok(CoverageRecord {
        id: row.try_get("id").map_err(internal)?,
        project_name: row.try_get("project_name").map_err(internal)?,
        branch: row.try_get("branch").map_err(internal)?,
        commit_hash: row.try_get("commit_hash").map_err(internal)?,
        statements_coverage: row.try_get("statements_coverage").map_err(internal)?,
        branches_coverage: row.try_get("branches_coverage").map_err(internal)?,
        functions_coverage: row.try_get("functions_coverage").map_err(internal)?,
        lines_coverage: row.try_get("lines_coverage").map_err(internal)?,
        total_tests: row.try_get("total_tests").map_err(internal)?,
        passed_tests: row.try_get("passed_tests").map_err(internal)?,
        failed_tests: row.try_get("failed_tests").map_err(internal)?,
        duration: row.try_get("duration").map_err(internal)?,
        created_at,
    })
}

fn internal(err: impl std::fmt::Display) -> CoreError {
    CoreError::Internal(err.to_string())
}
