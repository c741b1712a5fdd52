//! Job description text parsing. The AI path is tried first when
//! configured; the deterministic extractor is always available and never
//! fails, it just leaves unrecognized fields empty.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::warn;

use crate::admission::RateLimiter;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::errors::AppError;
use crate::models::candidate::EducationLevel;
use crate::models::job::{JobRequirement, WeightedSkill};
use crate::store::prompts;

use serde::Deserialize;

pub const DEFAULT_JOB_NAME: &str = "未命名职位";

/// Skills the deterministic extractor recognizes.
const SKILL_DICT: &[&str] = &[
    "PR", "剪映", "视频拍摄", "抖音", "快手", "直播", "剪辑", "PS", "摄影", "AE", "达芬奇",
];

const EXCLUDE_DICT: &[&str] = &["兼职", "实习", "远程"];

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"职位[：:]\s*(\S+)").expect("valid regex"))
}

fn experience_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*年以上").expect("valid regex"))
}

fn salary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*[-~～]\s*(\d+)\s*[kK千]").expect("valid regex"))
}

/// A skill preceded within 10 characters by a proficiency marker is
/// treated as required rather than a bonus.
fn proficiency_re(skill: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)(熟练|精通|必须|掌握|会).{{0,10}}{}",
        regex::escape(skill)
    ))
    .expect("valid regex")
}

/// Highest degree keyword mentioned anywhere in the text wins.
fn extract_education(text: &str) -> Option<EducationLevel> {
    let tiers = [
        ("博士", EducationLevel::Doctorate),
        ("硕士", EducationLevel::Master),
        ("本科", EducationLevel::Bachelor),
        ("大专", EducationLevel::Associate),
        ("高中", EducationLevel::Highschool),
    ];
    tiers
        .into_iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, level)| level)
}

/// Deterministic extraction. Unrecognized text produces a requirement with
/// the placeholder name and no constraints — never an error.
pub fn rule_based_parse(raw: &str) -> JobRequirement {
    let name = name_re()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string());

    let mut job = JobRequirement::new(name);
    job.min_education = extract_education(raw);

    if let Some(captures) = experience_re().captures(raw) {
        job.min_experience_years = captures[1].parse().unwrap_or(0);
    }
    if let Some(captures) = salary_re().captures(raw) {
        // Salary ranges are quoted in thousands ("8-12K").
        job.salary_min = captures[1].parse::<u32>().ok().map(|v| v * 1000);
        job.salary_max = captures[2].parse::<u32>().ok().map(|v| v * 1000);
    }

    let lower = raw.to_lowercase();
    for skill in SKILL_DICT {
        if !lower.contains(&skill.to_lowercase()) {
            continue;
        }
        if proficiency_re(skill).is_match(raw) {
            job.required_skills.push(WeightedSkill::required(*skill));
        } else {
            job.bonus_skills.push(WeightedSkill::bonus(*skill));
        }
    }
    for keyword in EXCLUDE_DICT {
        if raw.contains(keyword) {
            job.exclude_keywords.push(keyword.to_string());
        }
    }
    job.raw_text = Some(raw.to_string());
    job
}

/// What the model is asked to return for a parsing call.
#[derive(Debug, Deserialize)]
struct AiJobPayload {
    name: String,
    #[serde(default)]
    education: Option<String>,
    #[serde(default)]
    min_experience_years: Option<u32>,
    #[serde(default)]
    salary_min: Option<u32>,
    #[serde(default)]
    salary_max: Option<u32>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    bonus_skills: Vec<String>,
    #[serde(default)]
    exclude_keywords: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

pub struct JobTextParser {
    completion: Option<Arc<CompletionClient>>,
    limiter: Arc<RateLimiter>,
}

impl JobTextParser {
    pub fn new(completion: Option<Arc<CompletionClient>>, limiter: Arc<RateLimiter>) -> Self {
        Self { completion, limiter }
    }

    /// Parses free-form job text into a requirement. AI failures degrade
    /// to the deterministic extractor; this never fails.
    pub async fn parse(&self, raw: &str) -> JobRequirement {
        if let Some(client) = &self.completion {
            match self.ai_parse(client, raw).await {
                Ok(job) => return job,
                Err(e) => {
                    warn!("AI job parsing failed ({e}); using rule-based extraction");
                }
            }
        }
        rule_based_parse(raw)
    }

    async fn ai_parse(
        &self,
        client: &CompletionClient,
        raw: &str,
    ) -> Result<JobRequirement, AppError> {
        let request = CompletionRequest::new(prompts::build_parse_prompt(raw));
        let permit = self.limiter.wait_for_slot().await?;
        permit.record().await;
        let payload: AiJobPayload = client
            .complete_json(&request)
            .await
            .map_err(|e| AppError::Completion(e.to_string()))?;
        if payload.name.trim().is_empty() {
            return Err(AppError::Completion("model returned an empty job name".into()));
        }

        let mut job = JobRequirement::new(payload.name.trim());
        job.min_education = payload
            .education
            .as_deref()
            .and_then(EducationLevel::from_label);
        job.min_experience_years = payload.min_experience_years.unwrap_or(0);
        job.salary_min = payload.salary_min;
        job.salary_max = payload.salary_max;
        job.locations = payload.locations;
        job.required_skills = payload
            .required_skills
            .into_iter()
            .map(WeightedSkill::required)
            .collect();
        job.bonus_skills = payload
            .bonus_skills
            .into_iter()
            .map(WeightedSkill::bonus)
            .collect();
        job.exclude_keywords = payload.exclude_keywords;
        job.description = payload.description;
        job.raw_text = Some(raw.to_string());
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::RateLimits;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_extracts_all_fields_from_realistic_posting() {
        let raw = "职位：短视频剪辑\n本科及以上学历，3年以上经验，薪资8-12K\n熟练使用PR，要求会视频拍摄\n剪映经验加分\n兼职勿扰";
        let job = rule_based_parse(raw);

        assert_eq!(job.name, "短视频剪辑");
        assert_eq!(job.min_education, Some(EducationLevel::Bachelor));
        assert_eq!(job.min_experience_years, 3);
        assert_eq!(job.salary_min, Some(8000));
        assert_eq!(job.salary_max, Some(12000));

        let required: Vec<&str> = job.required_skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(required, vec!["PR", "视频拍摄"]);
        let bonus: Vec<&str> = job.bonus_skills.iter().map(|s| s.name.as_str()).collect();
        assert!(bonus.contains(&"剪映"));

        assert_eq!(job.exclude_keywords, vec!["兼职"]);
        assert_eq!(job.raw_text.as_deref(), Some(raw));
    }

    #[test]
    fn test_highest_education_keyword_wins() {
        let job = rule_based_parse("大专或本科均可");
        assert_eq!(job.min_education, Some(EducationLevel::Bachelor));
    }

    #[test]
    fn test_salary_accepts_tilde_separator() {
        let job = rule_based_parse("薪资10~15k，弹性工作");
        assert_eq!(job.salary_min, Some(10000));
        assert_eq!(job.salary_max, Some(15000));
    }

    #[test]
    fn test_proficiency_marker_is_case_insensitive() {
        let job = rule_based_parse("熟练使用pr进行剪辑");
        let required: Vec<&str> = job.required_skills.iter().map(|s| s.name.as_str()).collect();
        assert!(required.contains(&"PR"));
    }

    #[test]
    fn test_garbage_text_never_errors() {
        let job = rule_based_parse("!!!@@@###");
        assert_eq!(job.name, DEFAULT_JOB_NAME);
        assert!(job.min_education.is_none());
        assert_eq!(job.min_experience_years, 0);
        assert!(job.salary_min.is_none());
        assert!(job.required_skills.is_empty());
        assert!(job.exclude_keywords.is_empty());
    }

    #[tokio::test]
    async fn test_parse_without_client_uses_rule_extraction() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimits::default(),
            Arc::new(MemoryStorage::new()),
        ));
        let parser = JobTextParser::new(None, limiter);
        let job = parser.parse("职位：运营 5年以上").await;
        assert_eq!(job.name, "运营");
        assert_eq!(job.min_experience_years, 5);
    }
}
