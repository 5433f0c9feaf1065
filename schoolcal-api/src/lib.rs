//! schoolcal-api library - HTTP surface for the school calendar tracker
//!
//! Serves the scraping-workflow endpoints (prompt issuance, data ingest,
//! re-scrape candidate selection) plus the full-dump display endpoint.

use axum::Router;
use sqlx::SqlitePool;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/schools/:school_id/prompt", get(api::school_prompt))
        .route("/api/schools/random/prompt", get(api::random_school_prompt))
        .route("/api/schools/data", post(api::upsert_school_data))
        .route("/api/schools/invalid-data", get(api::claim_invalid_data))
        .route("/api/schools", get(api::list_schools))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
