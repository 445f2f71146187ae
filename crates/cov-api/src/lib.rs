//! Coverage Tracker API Server
//!
//! HTTP boundary over the `cov-core` aggregation engine: a SQLite-backed
//! record store, the route handlers, and process configuration.

pub mod db;
pub mod routes;

use cov_core::CoverageService;

/// Application state shared across handlers
pub struct AppState {
    pub service: CoverageService,
    pub config: AppConfig,
}

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://coverage.db".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}
