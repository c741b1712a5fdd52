//! Prompt template for AI-assisted candidate scoring.

use crate::models::candidate::CandidateProfile;
use crate::models::job::JobRequirement;

pub const CANDIDATE_SCORE_PROMPT: &str = r#"你是一名资深招聘顾问。请根据以下职位要求评估候选人的匹配程度。

【职位要求】
{job}

【候选人资料】
{candidate}

请严格按照以下 JSON 格式输出（不要输出其他内容）：
{"score": 0到100的整数, "reason": "一句话总结", "strengths": ["优势1", "优势2"], "weaknesses": ["不足1"]}"#;

fn weighted_names(skills: &[crate::models::job::WeightedSkill]) -> String {
    skills
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join("、")
}

pub fn build_score_prompt(candidate: &CandidateProfile, job: &JobRequirement) -> String {
    let mut job_lines = vec![format!("职位：{}", job.name)];
    if let Some(min) = job.min_education {
        job_lines.push(format!("最低学历：{}", min.as_str()));
    }
    if job.min_experience_years > 0 {
        job_lines.push(format!("最低经验：{}年", job.min_experience_years));
    }
    if !job.required_skills.is_empty() {
        job_lines.push(format!("必备技能：{}", weighted_names(&job.required_skills)));
    }
    if !job.bonus_skills.is_empty() {
        job_lines.push(format!("加分技能：{}", weighted_names(&job.bonus_skills)));
    }
    if !job.exclude_keywords.is_empty() {
        job_lines.push(format!("排除关键词：{}", job.exclude_keywords.join("、")));
    }
    if let Some(description) = &job.description {
        job_lines.push(format!("职位描述：{description}"));
    }

    let mut candidate_lines = vec![format!("姓名：{}", candidate.name)];
    candidate_lines.push(format!("学历：{}", candidate.education.as_str()));
    if let Some(years) = candidate.experience_years {
        candidate_lines.push(format!("工作经验：{years}年"));
    }
    if !candidate.skills.is_empty() {
        candidate_lines.push(format!("技能：{}", candidate.skills.join("、")));
    }
    if let Some(salary) = candidate.salary_expectation {
        candidate_lines.push(format!("期望薪资：{salary}"));
    }
    if let Some(raw) = &candidate.raw_text {
        candidate_lines.push(format!("简介：{raw}"));
    }

    CANDIDATE_SCORE_PROMPT
        .replace("{job}", &job_lines.join("\n"))
        .replace("{candidate}", &candidate_lines.join("\n"))
}
