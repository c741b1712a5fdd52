//! The scored, explained outcome of comparing one candidate to one job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Match tier, a pure function of the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    High,
    Medium,
    Low,
}

impl MatchLevel {
    /// score >= 80 => High, 60..=79 => Medium, else Low.
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            MatchLevel::High
        } else if score >= 60 {
            MatchLevel::Medium
        } else {
            MatchLevel::Low
        }
    }
}

/// Recruiter-facing next step, derived from the match level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    ScheduleInterview,
    ContinueChat,
    EvaluateCarefully,
}

impl SuggestedAction {
    pub fn from_level(level: MatchLevel) -> Self {
        match level {
            MatchLevel::High => SuggestedAction::ScheduleInterview,
            MatchLevel::Medium => SuggestedAction::ContinueChat,
            MatchLevel::Low => SuggestedAction::EvaluateCarefully,
        }
    }
}

/// Which scoring path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Ai,
    Rule,
}

/// Immutable evaluation result. Created fresh per scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_fingerprint: String,
    pub job_id: Uuid,
    /// Always clamped into [0, 100].
    pub score: u8,
    pub level: MatchLevel,
    pub matched_required_skills: Vec<String>,
    pub matched_bonus_skills: Vec<String>,
    pub triggered_exclusions: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub recommendation: String,
    pub suggested_action: SuggestedAction,
    pub source: ScoreSource,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(MatchLevel::from_score(100), MatchLevel::High);
        assert_eq!(MatchLevel::from_score(80), MatchLevel::High);
        assert_eq!(MatchLevel::from_score(79), MatchLevel::Medium);
        assert_eq!(MatchLevel::from_score(60), MatchLevel::Medium);
        assert_eq!(MatchLevel::from_score(59), MatchLevel::Low);
        assert_eq!(MatchLevel::from_score(0), MatchLevel::Low);
    }

    #[test]
    fn test_suggested_action_follows_level() {
        assert_eq!(
            SuggestedAction::from_level(MatchLevel::High),
            SuggestedAction::ScheduleInterview
        );
        assert_eq!(
            SuggestedAction::from_level(MatchLevel::Medium),
            SuggestedAction::ContinueChat
        );
        assert_eq!(
            SuggestedAction::from_level(MatchLevel::Low),
            SuggestedAction::EvaluateCarefully
        );
    }
}
