//! Deterministic rule-based scoring. Same inputs, same output — every
//! result here is reproducible without any external service.

use chrono::Utc;

use crate::models::candidate::{ActivityRecency, CandidateProfile, EducationLevel};
use crate::models::job::JobRequirement;
use crate::models::match_result::{MatchLevel, MatchResult, ScoreSource, SuggestedAction};

pub const BASE_SCORE: i32 = 50;
pub const SKILL_POINT_CAP: i32 = 30;
pub const DEFAULT_EXCLUSION_PENALTY: u32 = 20;

/// Tunable knobs of the rule path.
#[derive(Debug, Clone, Copy)]
pub struct ScoringPolicy {
    /// Points subtracted per triggered exclusion keyword. Valid range 20-30.
    pub exclusion_penalty: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            exclusion_penalty: DEFAULT_EXCLUSION_PENALTY,
        }
    }
}

impl ScoringPolicy {
    pub fn with_exclusion_penalty(penalty: u32) -> Self {
        Self {
            exclusion_penalty: penalty.clamp(20, 30),
        }
    }
}

/// Skill and exclusion hits, computed deterministically for both scoring
/// paths.
#[derive(Debug, Default)]
pub struct SkillMatches {
    pub required: Vec<String>,
    pub bonus: Vec<String>,
    pub exclusions: Vec<String>,
    /// Sum of the weights of all matched skills, before the cap.
    pub points: u32,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive substring match in either direction: "Adobe PR"
/// matches the requirement "pr", and "photoshop" matches "Photoshop高级".
fn skills_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

pub fn match_skills(candidate: &CandidateProfile, job: &JobRequirement) -> SkillMatches {
    let mut matches = SkillMatches::default();
    for skill in &job.required_skills {
        if candidate.skills.iter().any(|s| skills_match(s, &skill.name)) {
            matches.required.push(skill.name.clone());
            matches.points += skill.weight;
        }
    }
    for skill in &job.bonus_skills {
        if candidate.skills.iter().any(|s| skills_match(s, &skill.name)) {
            matches.bonus.push(skill.name.clone());
            matches.points += skill.weight;
        }
    }
    for keyword in &job.exclude_keywords {
        let in_raw = candidate
            .raw_text
            .as_deref()
            .map_or(false, |text| contains_ci(text, keyword));
        let in_skills = candidate.skills.iter().any(|s| contains_ci(s, keyword));
        if in_raw || in_skills {
            matches.exclusions.push(keyword.clone());
        }
    }
    matches
}

pub fn recommendation_for(level: MatchLevel) -> &'static str {
    match level {
        MatchLevel::High => "强烈推荐约面试",
        MatchLevel::Medium => "可继续沟通了解",
        MatchLevel::Low => "谨慎评估",
    }
}

/// Scores a candidate against a requirement. Absent candidate fields and
/// absent job constraints contribute nothing; the result is always clamped
/// into [0, 100].
pub fn rule_based_score(
    candidate: &CandidateProfile,
    job: &JobRequirement,
    policy: &ScoringPolicy,
) -> MatchResult {
    let mut score = BASE_SCORE;
    let mut pros = Vec::new();
    let mut cons = Vec::new();

    // Education tier bonus applies only when the job sets a floor and the
    // candidate clears it.
    if let Some(min) = job.min_education {
        if candidate.education >= min {
            let bonus = match candidate.education {
                EducationLevel::Doctorate | EducationLevel::Master => 20,
                EducationLevel::Bachelor => 15,
                EducationLevel::Associate => 10,
                _ => 0,
            };
            if bonus > 0 {
                score += bonus;
                pros.push(format!(
                    "Education {} meets the requirement",
                    candidate.education.as_str()
                ));
            }
        } else {
            cons.push(format!("Education below the required {}", min.as_str()));
        }
    }

    // Falling short of a positive experience requirement earns nothing.
    if job.min_experience_years > 0
        && candidate.experience_years.unwrap_or(0) < job.min_experience_years
    {
        cons.push(format!(
            "Experience below the required {} years",
            job.min_experience_years
        ));
    } else if let Some(years) = candidate.experience_years {
        let bonus = if years >= 3 {
            20
        } else if years >= 2 {
            15
        } else if years >= 1 {
            10
        } else {
            5
        };
        score += bonus;
        pros.push(format!("{years} years of experience"));
    }

    let matches = match_skills(candidate, job);
    if matches.points > 0 {
        score += (matches.points as i32).min(SKILL_POINT_CAP);
    }
    if !matches.required.is_empty() {
        pros.push(format!(
            "Matched required skills: {}",
            matches.required.join(", ")
        ));
    }
    if !matches.bonus.is_empty() {
        pros.push(format!("Matched bonus skills: {}", matches.bonus.join(", ")));
    }
    for keyword in &matches.exclusions {
        score -= policy.exclusion_penalty as i32;
        cons.push(format!("Exclusion keyword found: {keyword}"));
    }

    let populated = [
        candidate.education != EducationLevel::None,
        candidate.experience_years.is_some(),
        !candidate.skills.is_empty(),
        candidate.salary_expectation.is_some(),
        candidate.raw_text.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count() as i32;
    if populated > 0 {
        score += (populated * 2).min(10);
        pros.push(format!("Profile completeness {populated}/5"));
    }

    let activity_bonus = match candidate.activity {
        ActivityRecency::JustActive => 15,
        ActivityRecency::Today => 10,
        ActivityRecency::ThisWeek => 5,
        _ => 0,
    };
    if activity_bonus > 0 {
        score += activity_bonus;
        pros.push(match candidate.activity {
            ActivityRecency::JustActive => "Active just now".to_string(),
            ActivityRecency::Today => "Active today".to_string(),
            _ => "Active this week".to_string(),
        });
    }

    let score = score.clamp(0, 100) as u8;
    let level = MatchLevel::from_score(score);
    MatchResult {
        candidate_fingerprint: candidate.fingerprint(),
        job_id: job.id,
        score,
        level,
        matched_required_skills: matches.required,
        matched_bonus_skills: matches.bonus,
        triggered_exclusions: matches.exclusions,
        pros,
        cons,
        recommendation: recommendation_for(level).to_string(),
        suggested_action: SuggestedAction::from_level(level),
        source: ScoreSource::Rule,
        computed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::WeightedSkill;

    fn candidate(name: &str) -> CandidateProfile {
        CandidateProfile {
            name: name.to_string(),
            education: EducationLevel::None,
            experience_years: None,
            skills: Vec::new(),
            salary_expectation: None,
            activity: ActivityRecency::Unknown,
            raw_text: None,
        }
    }

    #[test]
    fn test_bare_candidate_against_empty_job_scores_base() {
        let result = rule_based_score(
            &candidate("王芳"),
            &JobRequirement::new("运营"),
            &ScoringPolicy::default(),
        );
        assert_eq!(result.score, 50);
        assert_eq!(result.level, MatchLevel::Low);
        assert_eq!(result.source, ScoreSource::Rule);
        assert!(result.cons.is_empty());
    }

    #[test]
    fn test_strong_candidate_clamps_to_one_hundred() {
        let mut job = JobRequirement::new("短视频拍摄剪辑运营");
        job.min_education = Some(EducationLevel::Bachelor);
        job.required_skills = vec![WeightedSkill::required("PR"), WeightedSkill::required("剪映")];
        job.bonus_skills = vec![WeightedSkill::bonus("抖音")];

        let strong = CandidateProfile {
            name: "张伟".to_string(),
            education: EducationLevel::Bachelor,
            experience_years: Some(3),
            skills: vec!["PR".to_string(), "剪映".to_string(), "抖音".to_string()],
            salary_expectation: Some(12000),
            activity: ActivityRecency::Today,
            raw_text: Some("三年短视频剪辑经验".to_string()),
        };

        // 50 + 15 + 20 + 25 + 10 + 10 = 130, clamped.
        let result = rule_based_score(&strong, &job, &ScoringPolicy::default());
        assert_eq!(result.score, 100);
        assert_eq!(result.level, MatchLevel::High);
        assert_eq!(result.suggested_action, SuggestedAction::ScheduleInterview);
        assert_eq!(result.matched_required_skills, vec!["PR", "剪映"]);
        assert_eq!(result.matched_bonus_skills, vec!["抖音"]);
    }

    #[test]
    fn test_education_below_floor_earns_no_tier_bonus() {
        let mut job = JobRequirement::new("算法工程师");
        job.min_education = Some(EducationLevel::Master);

        let mut c = candidate("李雷");
        c.education = EducationLevel::Bachelor;
        let result = rule_based_score(&c, &job, &ScoringPolicy::default());
        // 50 base + 2 completeness, no education points.
        assert_eq!(result.score, 52);
        assert!(result.cons.iter().any(|line| line.contains("master")));
    }

    #[test]
    fn test_no_education_floor_means_no_tier_bonus() {
        let mut c = candidate("博士生");
        c.education = EducationLevel::Doctorate;
        let result = rule_based_score(&c, &JobRequirement::new("运营"), &ScoringPolicy::default());
        assert_eq!(result.score, 52);
    }

    #[test]
    fn test_experience_below_positive_requirement_earns_nothing() {
        let mut job = JobRequirement::new("运营");
        job.min_experience_years = 3;

        let mut c = candidate("王芳");
        c.experience_years = Some(2);
        let result = rule_based_score(&c, &job, &ScoringPolicy::default());
        assert_eq!(result.score, 52);
        assert!(result.cons.iter().any(|line| line.contains("3 years")));
    }

    #[test]
    fn test_experience_bonus_scales_with_years() {
        let job = JobRequirement::new("运营");
        let policy = ScoringPolicy::default();
        for (years, expected) in [(0, 57), (1, 62), (2, 67), (3, 72), (10, 72)] {
            let mut c = candidate("王芳");
            c.experience_years = Some(years);
            // experience bonus + 2 completeness on top of base.
            assert_eq!(rule_based_score(&c, &job, &policy).score, expected);
        }
    }

    #[test]
    fn test_combined_skill_points_are_capped() {
        let mut job = JobRequirement::new("剪辑");
        job.required_skills = (0..5)
            .map(|i| WeightedSkill::required(format!("skill{i}")))
            .collect();

        let mut c = candidate("王芳");
        c.skills = (0..5).map(|i| format!("skill{i}")).collect();
        // 50 + min(50, 30) + 2 completeness.
        let result = rule_based_score(&c, &job, &ScoringPolicy::default());
        assert_eq!(result.score, 82);
        assert_eq!(result.matched_required_skills.len(), 5);
    }

    #[test]
    fn test_skill_match_is_case_insensitive_and_bidirectional() {
        let mut job = JobRequirement::new("剪辑");
        job.required_skills = vec![WeightedSkill::required("pr")];
        job.bonus_skills = vec![WeightedSkill::bonus("Photoshop高级")];

        let mut c = candidate("王芳");
        c.skills = vec!["Adobe PR".to_string(), "photoshop".to_string()];
        let matches = match_skills(&c, &job);
        assert_eq!(matches.required, vec!["pr"]);
        assert_eq!(matches.bonus, vec!["Photoshop高级"]);
    }

    #[test]
    fn test_exclusion_keywords_subtract_and_clamp_at_zero() {
        let mut job = JobRequirement::new("运营");
        job.exclude_keywords = vec!["兼职".to_string(), "实习".to_string(), "远程".to_string()];

        let mut c = candidate("王芳");
        c.raw_text = Some("在校实习，希望远程兼职".to_string());
        // 50 + 2 completeness - 3 * 20, clamped at 0.
        let result = rule_based_score(&c, &job, &ScoringPolicy::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.triggered_exclusions.len(), 3);
        assert_eq!(result.cons.len(), 3);
    }

    #[test]
    fn test_exclusion_keyword_found_in_skill_list() {
        let mut job = JobRequirement::new("运营");
        job.exclude_keywords = vec!["兼职".to_string()];

        let mut c = candidate("王芳");
        c.skills = vec!["兼职运营".to_string()];
        let result = rule_based_score(&c, &job, &ScoringPolicy::default());
        assert_eq!(result.triggered_exclusions, vec!["兼职"]);
    }

    #[test]
    fn test_policy_clamps_exclusion_penalty_into_range() {
        assert_eq!(ScoringPolicy::with_exclusion_penalty(10).exclusion_penalty, 20);
        assert_eq!(ScoringPolicy::with_exclusion_penalty(25).exclusion_penalty, 25);
        assert_eq!(ScoringPolicy::with_exclusion_penalty(50).exclusion_penalty, 30);
    }

    #[test]
    fn test_activity_bonus_tiers() {
        let job = JobRequirement::new("运营");
        let policy = ScoringPolicy::default();
        for (activity, expected) in [
            (ActivityRecency::JustActive, 65),
            (ActivityRecency::Today, 60),
            (ActivityRecency::ThisWeek, 55),
            (ActivityRecency::Stale, 50),
            (ActivityRecency::Unknown, 50),
        ] {
            let mut c = candidate("王芳");
            c.activity = activity;
            assert_eq!(rule_based_score(&c, &job, &policy).score, expected);
        }
    }

    #[test]
    fn test_medium_level_suggests_continue_chat() {
        let mut c = candidate("王芳");
        c.experience_years = Some(3);
        c.activity = ActivityRecency::Unknown;
        // 50 + 20 + 2 = 72 → medium.
        let result = rule_based_score(&c, &JobRequirement::new("运营"), &ScoringPolicy::default());
        assert_eq!(result.level, MatchLevel::Medium);
        assert_eq!(result.suggested_action, SuggestedAction::ContinueChat);
        assert_eq!(result.recommendation, "可继续沟通了解");
    }
}
