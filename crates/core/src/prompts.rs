//! Prompt Templates
//!
//! Every prompt sent to the model comes from a named Markdown template with
//! `{placeholder}` slots. Built-in templates are compiled into the binary; a
//! directory of `<key>.md` files can override any of them.

use std::{collections::HashMap, fs, io, path::Path};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    ProficiencyQuestion,
    ProficiencyEvaluation,
    PersonalityQuestion,
    PersonalityEvaluation,
    LearningPlan,
    Exercises,
}

impl PromptKey {
    pub const ALL: [PromptKey; 6] = [
        PromptKey::ProficiencyQuestion,
        PromptKey::ProficiencyEvaluation,
        PromptKey::PersonalityQuestion,
        PromptKey::PersonalityEvaluation,
        PromptKey::LearningPlan,
        PromptKey::Exercises,
    ];

    /// File stem of the template in a prompts directory.
    pub fn file_stem(self) -> &'static str {
        match self {
            PromptKey::ProficiencyQuestion => "proficiency_question",
            PromptKey::ProficiencyEvaluation => "proficiency_evaluation",
            PromptKey::PersonalityQuestion => "personality_question",
            PromptKey::PersonalityEvaluation => "personality_evaluation",
            PromptKey::LearningPlan => "learning_plan",
            PromptKey::Exercises => "exercises",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            PromptKey::ProficiencyQuestion => include_str!("../prompts/proficiency_question.md"),
            PromptKey::ProficiencyEvaluation => {
                include_str!("../prompts/proficiency_evaluation.md")
            }
            PromptKey::PersonalityQuestion => include_str!("../prompts/personality_question.md"),
            PromptKey::PersonalityEvaluation => {
                include_str!("../prompts/personality_evaluation.md")
            }
            PromptKey::LearningPlan => include_str!("../prompts/learning_plan.md"),
            PromptKey::Exercises => include_str!("../prompts/exercises.md"),
        }
    }

    fn from_file_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.file_stem() == stem)
    }
}

/// The full set of templates in use.
#[derive(Debug, Clone)]
pub struct PromptBook {
    templates: HashMap<PromptKey, String>,
}

impl Default for PromptBook {
    fn default() -> Self {
        let templates = PromptKey::ALL
            .into_iter()
            .map(|key| (key, key.builtin().to_string()))
            .collect();
        Self { templates }
    }
}

impl PromptBook {
    /// Built-in templates with any `<key>.md` file in `dir` taking precedence.
    pub fn with_overrides(dir: &Path) -> io::Result<Self> {
        let mut book = Self::default();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match PromptKey::from_file_stem(stem) {
                Some(key) => {
                    book.templates.insert(key, fs::read_to_string(&path)?);
                    info!(template = stem, "Prompt template overridden");
                }
                None => warn!(file = %path.display(), "Ignoring unknown prompt template"),
            }
        }
        Ok(book)
    }

    pub fn template(&self, key: PromptKey) -> &str {
        self.templates
            .get(&key)
            .map_or_else(|| key.builtin(), String::as_str)
    }

    /// Fills the `{name}` slots of a template in one pass.
    ///
    /// Substituted values are never re-scanned, and slots without a value are
    /// left as written.
    pub fn render(&self, key: PromptKey, vars: &[(&str, &str)]) -> String {
        let template = self.template(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let slot = after
                .find('}')
                .map(|close| &after[..close])
                .filter(|name| name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            match slot.and_then(|name| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| (name, v))) {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_is_present() {
        let book = PromptBook::default();
        for key in PromptKey::ALL {
            assert!(!book.template(key).trim().is_empty(), "{key:?} is empty");
        }
    }

    #[test]
    fn test_render_substitutes_known_slots_once() {
        let book = PromptBook::default();
        let prompt = book.render(
            PromptKey::ProficiencyQuestion,
            &[("level", "A2"), ("language", "{level} French")],
        );
        assert!(prompt.contains("CEFR A2 question"));
        // The value's own braces are not expanded again.
        assert!(prompt.contains("{level} French"));
    }

    #[test]
    fn test_render_leaves_unknown_slots_and_stray_braces() {
        let mut book = PromptBook::default();
        book.templates.insert(
            PromptKey::Exercises,
            "Hi {name}, {unknown} and { spaced } and {".to_string(),
        );
        let out = book.render(PromptKey::Exercises, &[("name", "Ana")]);
        assert_eq!(out, "Hi Ana, {unknown} and { spaced } and {");
    }

    #[test]
    fn test_directory_overrides_builtins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("learning_plan.md"), "Plan for {name}").unwrap();
        fs::write(dir.path().join("notes.md"), "not a template").unwrap();
        fs::write(dir.path().join("exercises.txt"), "wrong extension").unwrap();

        let book = PromptBook::with_overrides(dir.path()).unwrap();
        assert_eq!(
            book.render(PromptKey::LearningPlan, &[("name", "Ana")]),
            "Plan for Ana"
        );
        assert_eq!(
            book.template(PromptKey::Exercises),
            PromptKey::Exercises.builtin()
        );
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PromptBook::with_overrides(&dir.path().join("absent")).is_err());
    }
}
