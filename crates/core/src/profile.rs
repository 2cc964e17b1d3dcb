//! Learner Profile Model
//!
//! The single persistent record of the assistant. Assessment results are kept
//! in a two-part form: a structured classification when one can be extracted,
//! plus the narrative the model produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A Common European Framework of Reference proficiency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Levels the proficiency assessment writes questions for, in ascending order.
    pub const ASSESSED: [CefrLevel; 5] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
    ];

    const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// Finds the first standalone level token (e.g. "B1" in "around B1+") in a narrative.
    pub fn extract_from(text: &str) -> Option<CefrLevel> {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|token| token.parse().ok())
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CefrLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("'{0}' is not a CEFR level")]
pub struct UnknownLevel(pub String);

/// The languages the assistant can assess and teach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Italian,
    French,
    German,
    Spanish,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::Italian,
        Language::French,
        Language::German,
        Language::Spanish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Italian => "Italian",
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
        }
    }

    // English name, endonym, then the Portuguese names learners already typed in older menus.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Language::English => &["english", "inglês", "ingles"],
            Language::Italian => &["italian", "italiano"],
            Language::French => &["french", "français", "francais", "francês", "frances"],
            Language::German => &["german", "deutsch", "alemão", "alemao"],
            Language::Spanish => &["spanish", "español", "espanol", "espanhol"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| UnknownLanguage(s.trim().to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("'{0}' is not a supported language")]
pub struct UnknownLanguage(pub String);

/// Result of the proficiency assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProficiencyEstimate {
    /// Level extracted from the summary, if the model named one.
    pub level: Option<CefrLevel>,
    /// The model's narrative overview of the learner's performance.
    pub summary: String,
    pub assessed_at: DateTime<Utc>,
}

impl ProficiencyEstimate {
    pub fn from_summary(summary: String, assessed_at: DateTime<Utc>) -> Self {
        Self {
            level: CefrLevel::extract_from(&summary),
            summary,
            assessed_at,
        }
    }
}

/// Result of the personality / learning-style assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub summary: String,
    pub assessed_at: DateTime<Utc>,
}

impl LearnerProfile {
    pub fn new(summary: String, assessed_at: DateTime<Utc>) -> Self {
        Self {
            summary,
            assessed_at,
        }
    }
}

/// Everything the assistant knows about its single learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_language: Option<Language>,
    #[serde(default)]
    pub proficiency: Option<ProficiencyEstimate>,
    #[serde(default)]
    pub learner_profile: Option<LearnerProfile>,
}

/// A profile field that must be filled before study content can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingProfileField {
    #[error("the proficiency assessment has not been completed")]
    Proficiency,
    #[error("the personality assessment has not been completed")]
    LearnerProfile,
}

/// Borrowed view of a profile that satisfies the study-content precondition.
#[derive(Debug, Clone, Copy)]
pub struct StudyContext<'a> {
    pub name: &'a str,
    pub language: &'a str,
    pub proficiency: &'a ProficiencyEstimate,
    pub learner_profile: &'a LearnerProfile,
}

impl StudyContext<'_> {
    /// The level code, or "unknown" when the summary named none.
    pub fn level_code(&self) -> &'static str {
        self.proficiency.level.map_or("unknown", CefrLevel::code)
    }
}

impl UserProfile {
    /// Name shown in greetings, falling back to a neutral form of address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("learner")
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }

    /// Checks that both assessments are present and returns the fields study
    /// content is built from.
    pub fn study_context(&self) -> Result<StudyContext<'_>, MissingProfileField> {
        let proficiency = self
            .proficiency
            .as_ref()
            .filter(|p| !p.summary.trim().is_empty())
            .ok_or(MissingProfileField::Proficiency)?;
        let learner_profile = self
            .learner_profile
            .as_ref()
            .filter(|p| !p.summary.trim().is_empty())
            .ok_or(MissingProfileField::LearnerProfile)?;

        Ok(StudyContext {
            name: self.display_name(),
            language: self
                .target_language
                .map_or("the target language", Language::name),
            proficiency,
            learner_profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_level_extraction_finds_first_token() {
        assert_eq!(
            CefrLevel::extract_from("Estimated level: B1+, approaching B2."),
            Some(CefrLevel::B1)
        );
        assert_eq!(CefrLevel::extract_from("(a2) overall"), Some(CefrLevel::A2));
        assert_eq!(CefrLevel::extract_from("No clear level."), None);
        // Tokens must stand alone.
        assert_eq!(CefrLevel::extract_from("model XB12 output"), None);
    }

    #[test]
    fn test_assessed_levels_are_ascending() {
        let mut sorted = CefrLevel::ASSESSED;
        sorted.sort();
        assert_eq!(sorted, CefrLevel::ASSESSED);
        assert!(!CefrLevel::ASSESSED.contains(&CefrLevel::C2));
    }

    #[test]
    fn test_language_parsing_accepts_aliases() {
        assert_eq!("Spanish".parse(), Ok(Language::Spanish));
        assert_eq!("  español ".parse(), Ok(Language::Spanish));
        assert_eq!("Alemão".parse(), Ok(Language::German));
        assert_eq!("DEUTSCH".parse(), Ok(Language::German));
        assert_eq!("inglês".parse(), Ok(Language::English));
        assert_eq!(
            "Klingon".parse::<Language>(),
            Err(UnknownLanguage("Klingon".to_string()))
        );
    }

    #[test]
    fn test_proficiency_estimate_extracts_level() {
        let estimate = ProficiencyEstimate::from_summary("Solidly C1.".to_string(), at());
        assert_eq!(estimate.level, Some(CefrLevel::C1));
        assert_eq!(estimate.summary, "Solidly C1.");
    }

    #[test]
    fn test_study_context_requires_both_assessments() {
        let mut profile = UserProfile::default();
        assert_eq!(
            profile.study_context().unwrap_err(),
            MissingProfileField::Proficiency
        );

        profile.proficiency = Some(ProficiencyEstimate::from_summary("B2".into(), at()));
        assert_eq!(
            profile.study_context().unwrap_err(),
            MissingProfileField::LearnerProfile
        );

        profile.learner_profile = Some(LearnerProfile::new("   ".into(), at()));
        assert_eq!(
            profile.study_context().unwrap_err(),
            MissingProfileField::LearnerProfile
        );

        profile.learner_profile = Some(LearnerProfile::new("visual learner".into(), at()));
        let ctx = profile.study_context().unwrap();
        assert_eq!(ctx.name, "learner");
        assert_eq!(ctx.language, "the target language");
        assert_eq!(ctx.level_code(), "B2");
    }

    #[test]
    fn test_profile_deserializes_missing_keys_as_unset() {
        let profile: UserProfile = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Ana"));
        assert!(profile.target_language.is_none());
        assert!(profile.proficiency.is_none());
        assert!(profile.learner_profile.is_none());
    }
}
