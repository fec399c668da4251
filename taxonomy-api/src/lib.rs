//! taxonomy-api library - REST query service
//!
//! Read-only REST API over the taxonomy database: skill catalog, jobs and
//! job postings, and xblock skill tags with their verification state.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/v1/skills", get(api::skills::list_skills))
        .route("/api/v1/skills/:id", get(api::skills::get_skill))
        .route("/api/v1/jobs", get(api::jobs::list_jobs))
        .route("/api/v1/jobs/:id", get(api::jobs::get_job))
        .route("/api/v1/jobpostings", get(api::jobs::list_job_postings))
        .route("/api/v1/xblocks", get(api::xblocks::list_xblocks))
        .route("/api/v1/xblocks/:id", get(api::xblocks::get_xblock))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
