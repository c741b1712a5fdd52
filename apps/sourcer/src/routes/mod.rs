pub mod health;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::admission::RateStats;
use crate::outreach::handlers as outreach_handlers;
use crate::scoring::handlers as scoring_handlers;
use crate::state::AppState;
use crate::store::handlers as job_handlers;

/// GET /api/v1/rate/stats
async fn rate_stats(State(state): State<AppState>) -> Json<RateStats> {
    Json(state.limiter.stats())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/score", post(scoring_handlers::score_candidate))
        .route(
            "/api/v1/jobs",
            get(job_handlers::list_jobs).post(job_handlers::create_job),
        )
        .route("/api/v1/jobs/parse", post(job_handlers::parse_job))
        .route(
            "/api/v1/jobs/:id",
            put(job_handlers::update_job).delete(job_handlers::delete_job),
        )
        .route("/api/v1/jobs/:id/activate", post(job_handlers::activate_job))
        .route("/api/v1/rate/stats", get(rate_stats))
        .route("/api/v1/outreach", post(outreach_handlers::send_outreach))
        .with_state(state)
}
