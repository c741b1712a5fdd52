//! HTTP handlers for outreach. The service decides whether contact is
//! allowed and composes the message; actually delivering it is the
//! caller's job, so the guarded action here is message composition.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;
use crate::models::outreach::{Channel, OutreachRecord};
use crate::outreach::{greeting_text, OutreachOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OutreachRequest {
    pub candidate: CandidateProfile,
    #[serde(default = "default_channel")]
    pub channel: Channel,
    /// Defaults to the active job requirement.
    pub job_id: Option<Uuid>,
    /// When set, the request first settles the shared debouncer; a request
    /// superseded by a newer trigger yields no action.
    #[serde(default)]
    pub debounce: bool,
}

fn default_channel() -> Channel {
    Channel::Greet
}

#[derive(Debug, Serialize)]
pub struct OutreachResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<OutreachRecord>,
}

impl OutreachResponse {
    fn declined(outcome: &'static str) -> Self {
        Self {
            outcome,
            wait_ms: None,
            message: None,
            record: None,
        }
    }
}

/// POST /api/v1/outreach
pub async fn send_outreach(
    State(state): State<AppState>,
    Json(request): Json<OutreachRequest>,
) -> Result<Json<OutreachResponse>, AppError> {
    if request.candidate.name.trim().is_empty() {
        return Err(AppError::Validation("candidate name must not be empty".into()));
    }
    let job = match request.job_id {
        Some(id) => state.jobs.get(id)?,
        None => state.jobs.get_active()?,
    };

    if request.debounce && !state.debouncer.settle().await {
        return Ok(Json(OutreachResponse::declined("superseded")));
    }

    let message = greeting_text(&job);
    let fingerprint = request.candidate.fingerprint();
    let outcome = state
        .outreach
        .attempt_outreach(&fingerprint, job.id, request.channel, || async { Ok(()) })
        .await?;

    let response = match outcome {
        OutreachOutcome::Sent(record) => OutreachResponse {
            outcome: "sent",
            wait_ms: None,
            message: Some(message),
            record: Some(record),
        },
        OutreachOutcome::Duplicate(record) => OutreachResponse {
            outcome: "duplicate",
            wait_ms: None,
            message: None,
            record,
        },
        OutreachOutcome::TooSoon { wait } => OutreachResponse {
            outcome: "too_soon",
            wait_ms: Some(wait.as_millis() as u64),
            message: None,
            record: None,
        },
        OutreachOutcome::Failed(record) => OutreachResponse {
            outcome: "failed",
            wait_ms: None,
            message: None,
            record: Some(record),
        },
    };
    Ok(Json(response))
}
