//! Prompt template for AI-assisted job text parsing.

pub const JOB_PARSE_PROMPT: &str = r#"你是一名招聘信息结构化助手。请从以下职位描述中提取结构化信息。

【职位描述】
{text}

请严格按照以下 JSON 格式输出（不要输出其他内容，未提及的字段省略或留空）：
{"name": "职位名称", "education": "学历要求（博士/硕士/本科/大专/高中）", "min_experience_years": 最低工作年限整数, "salary_min": 最低月薪整数, "salary_max": 最高月薪整数, "locations": ["工作地点"], "required_skills": ["必备技能"], "bonus_skills": ["加分技能"], "exclude_keywords": ["排除关键词"], "description": "一句话职位概述"}"#;

pub fn build_parse_prompt(raw: &str) -> String {
    JOB_PARSE_PROMPT.replace("{text}", raw)
}
