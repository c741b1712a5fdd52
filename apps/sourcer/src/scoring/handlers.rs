//! HTTP handlers for scoring.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;
use crate::models::match_result::MatchResult;
use crate::scoring::ScoreOptions;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub candidate: CandidateProfile,
    /// Defaults to the active job requirement.
    pub job_id: Option<Uuid>,
    /// Overrides the configured default AI preference.
    pub use_ai: Option<bool>,
}

/// POST /api/v1/score
pub async fn score_candidate(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let job = match request.job_id {
        Some(id) => state.jobs.get(id)?,
        None => state.jobs.get_active()?,
    };
    let options = ScoreOptions {
        use_ai: request.use_ai.unwrap_or(state.default_use_ai),
    };
    let result = state
        .scoring
        .compute_score(&request.candidate, &job, &options)
        .await?;
    Ok(Json(result))
}
