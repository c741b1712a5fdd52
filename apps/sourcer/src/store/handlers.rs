//! HTTP handlers for job requirement management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::EducationLevel;
use crate::models::job::{JobRequirement, WeightedSkill};
use crate::state::AppState;

/// Caller-supplied requirement fields. Ids and timestamps are always
/// assigned server-side.
#[derive(Debug, Deserialize)]
pub struct JobDraft {
    pub name: String,
    #[serde(default)]
    pub min_education: Option<EducationLevel>,
    #[serde(default)]
    pub min_experience_years: u32,
    #[serde(default)]
    pub required_skills: Vec<WeightedSkill>,
    #[serde(default)]
    pub bonus_skills: Vec<WeightedSkill>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl JobDraft {
    fn into_requirement(self) -> JobRequirement {
        let mut job = JobRequirement::new(self.name);
        job.min_education = self.min_education;
        job.min_experience_years = self.min_experience_years;
        job.required_skills = self.required_skills;
        job.bonus_skills = self.bonus_skills;
        job.exclude_keywords = self.exclude_keywords;
        job.salary_min = self.salary_min;
        job.salary_max = self.salary_max;
        job.locations = self.locations;
        job.description = self.description;
        job
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRequirement>,
    pub active_id: Option<Uuid>,
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.jobs.list(),
        active_id: state.jobs.active_id(),
    })
}

/// POST /api/v1/jobs
pub async fn create_job(
    State(state): State<AppState>,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<JobRequirement>), AppError> {
    let job = state.jobs.create(draft.into_requirement()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/v1/jobs/:id
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<JobDraft>,
) -> Result<Json<JobRequirement>, AppError> {
    let job = state.jobs.update(id, draft.into_requirement()).await?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.jobs.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/activate
pub async fn activate_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRequirement>, AppError> {
    let job = state.jobs.set_active(id).await?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    pub text: String,
    /// When set, the parsed requirement is stored immediately.
    #[serde(default)]
    pub save: bool,
}

/// POST /api/v1/jobs/parse
pub async fn parse_job(
    State(state): State<AppState>,
    Json(request): Json<ParseJobRequest>,
) -> Result<Json<JobRequirement>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("job text must not be empty".into()));
    }
    let parsed = state.parser.parse(&request.text).await;
    let job = if request.save {
        state.jobs.create(parsed).await?
    } else {
        parsed
    };
    Ok(Json(job))
}
