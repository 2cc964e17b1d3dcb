//! Study Content Generation
//!
//! Builds a learning plan or a set of exercises from a completed profile with
//! a single model call. Both generators refuse to call the model until the
//! profile holds both assessment results.

use crate::{
    llm_client::{GenerationError, TextGenerator},
    profile::{StudyContext, UserProfile},
    prompts::{PromptBook, PromptKey},
};
use tracing::info;

/// Returned instead of a learning plan when the profile is incomplete.
pub const INSUFFICIENT_PLAN_INFO: &str = "Not enough information to build a study plan. \
Please complete the proficiency assessment and the personality assessment first.";

/// Returned instead of exercises when the profile is incomplete.
pub const INSUFFICIENT_EXERCISE_INFO: &str = "Not enough information to generate exercises. \
Please complete the proficiency assessment and the personality assessment first.";

fn render_for(prompts: &PromptBook, key: PromptKey, ctx: &StudyContext<'_>) -> String {
    prompts.render(
        key,
        &[
            ("name", ctx.name),
            ("language", ctx.language),
            ("level", ctx.level_code()),
            ("proficiency", ctx.proficiency.summary.as_str()),
            ("learner_profile", ctx.learner_profile.summary.as_str()),
        ],
    )
}

fn generate(
    profile: &UserProfile,
    generator: &dyn TextGenerator,
    prompts: &PromptBook,
    key: PromptKey,
    insufficient: &str,
) -> Result<String, GenerationError> {
    let ctx = match profile.study_context() {
        Ok(ctx) => ctx,
        Err(missing) => {
            info!(%missing, template = key.file_stem(), "Profile incomplete, skipping generation");
            return Ok(insufficient.to_string());
        }
    };

    let prompt = render_for(prompts, key, &ctx);
    generator.generate_once(&prompt)
}

/// Creates a personalized study plan for the learner.
pub fn generate_learning_plan(
    profile: &UserProfile,
    generator: &dyn TextGenerator,
    prompts: &PromptBook,
) -> Result<String, GenerationError> {
    generate(
        profile,
        generator,
        prompts,
        PromptKey::LearningPlan,
        INSUFFICIENT_PLAN_INFO,
    )
}

/// Creates sample exercises, written in the target language, covering reading
/// comprehension, writing production, grammar and vocabulary.
pub fn generate_exercises(
    profile: &UserProfile,
    generator: &dyn TextGenerator,
    prompts: &PromptBook,
) -> Result<String, GenerationError> {
    generate(
        profile,
        generator,
        prompts,
        PromptKey::Exercises,
        INSUFFICIENT_EXERCISE_INFO,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        llm_client::MockTextGenerator,
        profile::{CefrLevel, Language, LearnerProfile, ProficiencyEstimate},
    };
    use chrono::{TimeZone, Utc};

    fn ana() -> UserProfile {
        let at = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();
        UserProfile {
            name: Some("Ana".to_string()),
            target_language: Some(Language::Spanish),
            proficiency: Some(ProficiencyEstimate::from_summary("B1".to_string(), at)),
            learner_profile: Some(LearnerProfile::new(
                "explorer, motivated by travel".to_string(),
                at,
            )),
        }
    }

    #[test]
    fn test_exercises_for_complete_profile_make_one_call() {
        let profile = ana();
        assert_eq!(
            profile.proficiency.as_ref().unwrap().level,
            Some(CefrLevel::B1)
        );

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate_once()
            .withf(|prompt| {
                ["Ana", "Spanish", "B1", "explorer, motivated by travel"]
                    .iter()
                    .all(|needle| prompt.contains(needle))
                    && prompt.contains("reading comprehension")
                    && prompt.contains("vocabulary")
            })
            .times(1)
            .returning(|_| Ok("  1. Lee el texto...\n".to_string()));
        generator.expect_converse().never();

        let out = generate_exercises(&profile, &generator, &PromptBook::default()).unwrap();
        assert_eq!(out, "  1. Lee el texto...\n");
    }

    #[test]
    fn test_learning_plan_for_complete_profile() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate_once()
            .withf(|prompt| prompt.contains("study plan for Ana") && prompt.contains("Spanish"))
            .times(1)
            .returning(|_| Ok("Week 1: ...".to_string()));

        let out = generate_learning_plan(&ana(), &generator, &PromptBook::default()).unwrap();
        assert_eq!(out, "Week 1: ...");
    }

    #[test]
    fn test_empty_profile_returns_fixed_message_without_calls() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate_once().never();
        generator.expect_converse().never();
        let book = PromptBook::default();

        let profile = UserProfile::default();
        assert_eq!(
            generate_learning_plan(&profile, &generator, &book).unwrap(),
            INSUFFICIENT_PLAN_INFO
        );
        assert_eq!(
            generate_exercises(&profile, &generator, &book).unwrap(),
            INSUFFICIENT_EXERCISE_INFO
        );
    }

    #[test]
    fn test_either_missing_assessment_blocks_generation() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate_once().never();
        let book = PromptBook::default();

        let mut no_level = ana();
        no_level.proficiency = None;
        let mut no_profile = ana();
        no_profile.learner_profile = None;

        for profile in [no_level, no_profile] {
            assert_eq!(
                generate_learning_plan(&profile, &generator, &book).unwrap(),
                INSUFFICIENT_PLAN_INFO
            );
            assert_eq!(
                generate_exercises(&profile, &generator, &book).unwrap(),
                INSUFFICIENT_EXERCISE_INFO
            );
        }
    }

    #[test]
    fn test_generation_error_propagates() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate_once()
            .times(1)
            .returning(|_| Err(GenerationError::Timeout(60)));

        let err = generate_learning_plan(&ana(), &generator, &PromptBook::default()).unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(60)));
    }
}
