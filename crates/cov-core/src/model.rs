//! Coverage domain types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One persisted coverage submission. Records are immutable once written;
/// the store is an append-only ledger with no update or delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    /// Store-assigned, monotonically increasing in insertion order.
    /// Used only as the tie-break in ordering, never as business data.
    pub id: i64,
    pub project_name: String,
    pub branch: String,
    pub commit_hash: String,
    pub statements_coverage: f64,
    pub branches_coverage: f64,
    pub functions_coverage: f64,
    pub lines_coverage: f64,
    pub total_tests: i64,
    pub passed_tests: i64,
    pub failed_tests: i64,
    /// Build duration in milliseconds.
    pub duration: i64,
    /// Assigned by the store at insertion time, never taken from the caller.
    #[serde(with = "local_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CoverageRecord {
    /// Composite ordering key. `created_at` values are not guaranteed
    /// unique, so `id` breaks ties.
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// A validated submission ready for the store, which assigns `id` and
/// `created_at` on append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub project_name: String,
    pub branch: String,
    pub commit_hash: String,
    pub statements_coverage: f64,
    pub branches_coverage: f64,
    pub functions_coverage: f64,
    pub lines_coverage: f64,
    pub total_tests: i64,
    pub passed_tests: i64,
    pub failed_tests: i64,
    pub duration: i64,
}

/// Per-project aggregate over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_name: String,
    pub avg_statements: f64,
    pub avg_branches: f64,
    pub avg_functions: f64,
    pub avg_lines: f64,
    #[serde(with = "local_timestamp")]
    pub last_updated: DateTime<Utc>,
    pub total_runs: i64,
}

/// Averages for one UTC calendar day. Days with no submissions produce
/// no point; trend series are sparse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub avg_statements: f64,
    pub avg_branches: f64,
    pub avg_functions: f64,
    pub avg_lines: f64,
}

/// Wire format for timestamps: `yyyy-MM-ddTHH:mm:ss`, no offset.
pub mod local_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(naive.and_utc())
    }
}
