//! Route table for the listing API

use super::handlers::{
    AppState, create_job, health_check, list_categories, list_featured_jobs, list_jobs,
    list_workers,
};
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build all routes
///
/// - GET /health, /healthz - Health check
/// - GET /api/jobs - One page of jobs (category, q, location, sort, page, limit)
/// - POST /api/jobs - Post a job
/// - GET /api/jobs/featured - First page of the featured jobs listing
/// - GET /api/workers - Workers (skill, experience, location, q, sort, page, limit)
/// - GET /api/categories - Job counts per category
///
/// Other methods on these paths answer 405.
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/featured", get(list_featured_jobs))
        .route("/api/workers", get(list_workers))
        .route("/api/categories", get(list_categories))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
