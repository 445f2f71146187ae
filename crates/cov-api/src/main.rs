//! Coverage Tracker API Server

use std::sync::Arc;

use cov_api::{db::SqliteStore, routes, AppConfig, AppState};
use cov_core::CoverageService;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cov_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coverage Tracker API Server");

    let config = AppConfig::default();

    // Connect to database and ensure the schema exists
    let store = SqliteStore::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    info!("Connected to database");

    let service = CoverageService::new(Arc::new(store));

    let state = Arc::new(AppState { service, config });

    let app = routes::app(state.clone());

    info!("Listening on {}", state.config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
