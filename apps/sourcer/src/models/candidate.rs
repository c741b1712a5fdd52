//! Candidate profile as extracted from a sourcing page — immutable per observation.

use serde::{Deserialize, Serialize};

/// Education level, ordered lowest to highest. The derived `Ord` follows
/// declaration order, so `Bachelor >= Associate` holds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    None,
    Highschool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::None => "none",
            EducationLevel::Highschool => "highschool",
            EducationLevel::Associate => "associate",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Doctorate => "doctorate",
        }
    }

    /// Maps a free-text label to a level. Accepts the Chinese degree words the
    /// sourcing platform uses as well as English labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.contains("博士") || label.eq_ignore_ascii_case("doctorate") {
            Some(EducationLevel::Doctorate)
        } else if label.contains("硕士") || label.eq_ignore_ascii_case("master") {
            Some(EducationLevel::Master)
        } else if label.contains("本科") || label.eq_ignore_ascii_case("bachelor") {
            Some(EducationLevel::Bachelor)
        } else if label.contains("大专") || label.eq_ignore_ascii_case("associate") {
            Some(EducationLevel::Associate)
        } else if label.contains("高中") || label.eq_ignore_ascii_case("highschool") {
            Some(EducationLevel::Highschool)
        } else {
            None
        }
    }
}

/// How recently the candidate was seen active on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityRecency {
    JustActive,
    Today,
    ThisWeek,
    Stale,
    #[default]
    Unknown,
}

/// A candidate profile. Only `name` is required; every other field degrades
/// to "no information" when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    #[serde(default)]
    pub education: EducationLevel,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub salary_expectation: Option<u32>,
    #[serde(default)]
    pub activity: ActivityRecency,
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl CandidateProfile {
    /// Best-effort identity key derived from name plus a few attributes.
    /// Two distinct people with the same name, education, and years of
    /// experience WILL collide; dedup and caching are collision-tolerant
    /// by design.
    pub fn fingerprint(&self) -> String {
        let years = self
            .experience_years
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}|{}|{}",
            self.name.trim().to_lowercase(),
            self.education.as_str(),
            years
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_levels_are_ordered() {
        assert!(EducationLevel::None < EducationLevel::Highschool);
        assert!(EducationLevel::Highschool < EducationLevel::Associate);
        assert!(EducationLevel::Associate < EducationLevel::Bachelor);
        assert!(EducationLevel::Bachelor < EducationLevel::Master);
        assert!(EducationLevel::Master < EducationLevel::Doctorate);
    }

    #[test]
    fn test_education_from_chinese_label() {
        assert_eq!(
            EducationLevel::from_label("本科及以上"),
            Some(EducationLevel::Bachelor)
        );
        assert_eq!(EducationLevel::from_label("大专"), Some(EducationLevel::Associate));
        assert_eq!(EducationLevel::from_label("博士"), Some(EducationLevel::Doctorate));
        assert_eq!(EducationLevel::from_label("小学"), None);
    }

    #[test]
    fn test_fingerprint_is_stable_and_collision_tolerant() {
        let a = CandidateProfile {
            name: "张伟".to_string(),
            education: EducationLevel::Bachelor,
            experience_years: Some(3),
            skills: vec!["PR".to_string()],
            salary_expectation: None,
            activity: ActivityRecency::Today,
            raw_text: None,
        };
        let mut b = a.clone();
        b.skills = vec![];
        b.activity = ActivityRecency::Stale;
        // Same name/education/years — deliberately the same fingerprint.
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), "张伟|bachelor|3");
    }

    #[test]
    fn test_fingerprint_missing_years_placeholder() {
        let c = CandidateProfile {
            name: " Li Lei ".to_string(),
            education: EducationLevel::None,
            experience_years: None,
            skills: vec![],
            salary_expectation: None,
            activity: ActivityRecency::Unknown,
            raw_text: None,
        };
        assert_eq!(c.fingerprint(), "li lei|none|-");
    }

    #[test]
    fn test_profile_deserializes_with_minimal_fields() {
        let json = r#"{"name": "王芳"}"#;
        let c: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(c.name, "王芳");
        assert_eq!(c.education, EducationLevel::None);
        assert_eq!(c.experience_years, None);
        assert!(c.skills.is_empty());
        assert_eq!(c.activity, ActivityRecency::Unknown);
    }
}
