//! Record store contract and in-memory implementation
//!
//! Coverage history is a ledger: the store exposes append and read
//! operations only, no update or delete. Any backing engine must make
//! each append atomic with respect to other appends and to reads, and
//! every read must observe a consistent snapshot.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{CoverageRecord, NewSubmission};
use crate::CoreResult;

/// Durable append-only collection of coverage submissions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Assigns `id` and `created_at`, persists the record, and returns
    /// the assigned id. Ids are monotonically increasing in insertion
    /// order.
    async fn append(&self, submission: NewSubmission) -> CoreResult<i64>;

    /// All records for a project, ordered by `(created_at desc, id desc)`.
    async fn all_by_project(&self, project_name: &str) -> CoreResult<Vec<CoverageRecord>>;

    /// Every record, in no particular order. Consumed only by aggregation.
    async fn all(&self) -> CoreResult<Vec<CoverageRecord>>;
}

/// In-memory store used by tests. The single `RwLock` gives appends
/// exclusive access and readers a stable snapshot.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<MemInner>,
}

#[derive(Default)]
struct MemInner {
    next_id: i64,
    records: Vec<CoverageRecord>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemStore {
    async fn append(&self, submission: NewSubmission) -> CoreResult<i64> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(CoverageRecord {
            id,
            project_name: submission.project_name,
            branch: submission.branch,
            commit_hash: submission.commit_hash,
            statements_coverage: submission.statements_coverage,
            branches_coverage: submission.branches_coverage,
            functions_coverage: submission.functions_coverage,
            lines_coverage: submission.lines_coverage,
            total_tests: submission.total_tests,
            passed_tests: submission.passed_tests,
            failed_tests: submission.failed_tests,
            duration: submission.duration,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn all_by_project(&self, project_name: &str) -> CoreResult<Vec<CoverageRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<CoverageRecord> = inner
            .records
            .iter()
            .filter(|r| r.project_name == project_name)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(records)
    }

    async fn all(&self) -> CoreResult<Vec<CoverageRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.clone())
    }
}
