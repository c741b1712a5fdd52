//! Job requirement configuration — the hiring side of a match evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::EducationLevel;

pub const DEFAULT_REQUIRED_WEIGHT: u32 = 10;
pub const DEFAULT_BONUS_WEIGHT: u32 = 5;

/// A skill with a scoring weight. Required skills default to weight 10,
/// bonus skills to weight 5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedSkill {
    pub name: String,
    pub weight: u32,
}

impl WeightedSkill {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: DEFAULT_REQUIRED_WEIGHT,
        }
    }

    pub fn bonus(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: DEFAULT_BONUS_WEIGHT,
        }
    }
}

/// A named job requirement. Absent fields impose no constraint — a
/// requirement with nothing but a name matches every candidate at the
/// base score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequirement {
    pub id: Uuid,
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
    /// Source text this requirement was parsed from, if any.
    #[serde(default)]
    pub raw_text: Option<String>,
    /// One-line description of the role, used for greeting templates.
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRequirement {
    /// An empty requirement with only a name — no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            min_education: None,
            min_experience_years: 0,
            required_skills: Vec::new(),
            bonus_skills: Vec::new(),
            exclude_keywords: Vec::new(),
            salary_min: None,
            salary_max: None,
            locations: Vec::new(),
            raw_text: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}
