//! Scoring engine: AI-assisted when possible, deterministic rules always.

pub mod handlers;
pub mod prompts;
pub mod rules;

pub use rules::{rule_based_score, ScoringPolicy};

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::admission::RateLimiter;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobRequirement;
use crate::models::match_result::{MatchLevel, MatchResult, ScoreSource, SuggestedAction};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    pub use_ai: bool,
}

/// What the model is asked to return for a scoring call.
#[derive(Debug, Deserialize)]
struct AiScorePayload {
    score: i64,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
}

pub struct ScoringEngine {
    policy: ScoringPolicy,
    completion: Option<Arc<CompletionClient>>,
    limiter: Arc<RateLimiter>,
}

impl ScoringEngine {
    pub fn new(
        policy: ScoringPolicy,
        completion: Option<Arc<CompletionClient>>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            policy,
            completion,
            limiter,
        }
    }

    /// Scores a candidate against a requirement. The AI path is attempted
    /// when requested and configured; any failure there (admission quota,
    /// transport, timeout, malformed response) degrades transparently to
    /// the rule path and is never surfaced to the caller.
    pub async fn compute_score(
        &self,
        candidate: &CandidateProfile,
        job: &JobRequirement,
        options: &ScoreOptions,
    ) -> Result<MatchResult, AppError> {
        if candidate.name.trim().is_empty() {
            return Err(AppError::Validation("candidate name must not be empty".into()));
        }

        if options.use_ai {
            if let Some(client) = &self.completion {
                match self.ai_score(client, candidate, job).await {
                    Ok(result) => return Ok(result),
                    Err(e) => {
                        warn!("AI scoring failed ({e}); falling back to rule-based scoring");
                    }
                }
            } else {
                debug!("AI scoring requested but no completion client configured");
            }
        }

        Ok(rule_based_score(candidate, job, &self.policy))
    }

    async fn ai_score(
        &self,
        client: &CompletionClient,
        candidate: &CandidateProfile,
        job: &JobRequirement,
    ) -> Result<MatchResult, AppError> {
        let prompt = prompts::build_score_prompt(candidate, job);
        let request = CompletionRequest::new(prompt);

        let permit = self.limiter.wait_for_slot().await?;
        permit.record().await;
        let payload: AiScorePayload = client
            .complete_json(&request)
            .await
            .map_err(|e| AppError::Completion(e.to_string()))?;

        if !(0..=100).contains(&payload.score) {
            return Err(AppError::Completion(format!(
                "model returned score {} outside [0, 100]",
                payload.score
            )));
        }

        // The model supplies score and commentary; skill and exclusion
        // matches stay deterministic.
        let matches = rules::match_skills(candidate, job);
        let score = payload.score as u8;
        let level = MatchLevel::from_score(score);
        Ok(MatchResult {
            candidate_fingerprint: candidate.fingerprint(),
            job_id: job.id,
            score,
            level,
            matched_required_skills: matches.required,
            matched_bonus_skills: matches.bonus,
            triggered_exclusions: matches.exclusions,
            pros: payload.strengths,
            cons: payload.weaknesses,
            recommendation: payload
                .reason
                .unwrap_or_else(|| rules::recommendation_for(level).to_string()),
            suggested_action: SuggestedAction::from_level(level),
            source: ScoreSource::Ai,
            computed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::RateLimits;
    use crate::storage::MemoryStorage;

    fn engine_without_ai() -> ScoringEngine {
        let limiter = Arc::new(RateLimiter::new(
            RateLimits::default(),
            Arc::new(MemoryStorage::new()),
        ));
        ScoringEngine::new(ScoringPolicy::default(), None, limiter)
    }

    fn candidate(name: &str) -> CandidateProfile {
        CandidateProfile {
            name: name.to_string(),
            education: Default::default(),
            experience_years: None,
            skills: Vec::new(),
            salary_expectation: None,
            activity: Default::default(),
            raw_text: None,
        }
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_before_any_scoring() {
        let engine = engine_without_ai();
        let err = engine
            .compute_score(
                &candidate("   "),
                &JobRequirement::new("运营"),
                &ScoreOptions { use_ai: false },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ai_request_without_client_uses_rule_path() {
        let engine = engine_without_ai();
        let result = engine
            .compute_score(
                &candidate("王芳"),
                &JobRequirement::new("运营"),
                &ScoreOptions { use_ai: true },
            )
            .await
            .unwrap();
        assert_eq!(result.source, ScoreSource::Rule);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_ai_payload_tolerates_missing_optional_fields() {
        let payload: AiScorePayload = serde_json::from_str(r#"{"score": 85}"#).unwrap();
        assert_eq!(payload.score, 85);
        assert!(payload.reason.is_none());
        assert!(payload.strengths.is_empty());
    }
}
