//! Coverage Tracking Core Engine
//!
//! This crate provides the domain logic for recording per-build test
//! coverage submissions and answering analytical queries over them:
//! latest status per project, full history, windowed summaries and
//! day-bucketed trends.

pub mod engine;
pub mod ingest;
pub mod model;
pub mod store;

use thiserror::Error;

pub use engine::CoverageService;
pub use ingest::{CoverageUpload, MetricGroup, TestTotals, UploadSummary};
pub use model::{CoverageRecord, NewSubmission, ProjectSummary, TrendPoint};
pub use store::{MemStore, RecordStore};

/// Client-caused submission failures, detected before any store write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("malformed submission: missing {0}")]
    MalformedSubmission(String),

    #[error("invalid window: {0} days")]
    InvalidWindow(i64),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no coverage data found for project: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
