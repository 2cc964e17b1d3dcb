//! Assessment Engine
//!
//! Both assessments follow the same flow: generate questions through a chat
//! session, administer them to the learner, then ask the model to evaluate the
//! transcript. What differs between them lives in an `AssessmentStrategy`.

use crate::{
    llm_client::{ChatSession, GenerationError, TextGenerator, Turn},
    profile::{CefrLevel, Language},
    prompts::{PromptBook, PromptKey},
};
use std::{fmt, io};
use tracing::{debug, info, instrument};

/// How question prompts pick a target difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTargeting {
    None,
    /// Each question targets the least-covered CEFR level.
    RoundRobinCefr,
}

/// Everything that distinguishes one assessment from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentStrategy {
    pub name: &'static str,
    pub question_count: usize,
    pub question_template: PromptKey,
    pub evaluation_template: PromptKey,
    pub targeting: LevelTargeting,
}

impl AssessmentStrategy {
    /// CEFR placement test: three questions of rising difficulty.
    pub const PROFICIENCY: AssessmentStrategy = AssessmentStrategy {
        name: "proficiency",
        question_count: 3,
        question_template: PromptKey::ProficiencyQuestion,
        evaluation_template: PromptKey::ProficiencyEvaluation,
        targeting: LevelTargeting::RoundRobinCefr,
    };

    /// Personality / learning-style interview.
    pub const PERSONALITY: AssessmentStrategy = AssessmentStrategy {
        name: "personality",
        question_count: 2,
        question_template: PromptKey::PersonalityQuestion,
        evaluation_template: PromptKey::PersonalityEvaluation,
        targeting: LevelTargeting::None,
    };
}

/// Tracks how many questions were written for each assessed level.
#[derive(Debug, Clone, Default)]
pub struct LevelSelector {
    counts: [usize; CefrLevel::ASSESSED.len()],
}

impl LevelSelector {
    /// The level with the fewest questions so far; ties go to the lower level.
    pub fn next_target(&self) -> CefrLevel {
        let mut best = 0;
        for (idx, count) in self.counts.iter().enumerate() {
            if *count < self.counts[best] {
                best = idx;
            }
        }
        CefrLevel::ASSESSED[best]
    }

    pub fn record(&mut self, level: CefrLevel) {
        if let Some(idx) = CefrLevel::ASSESSED.iter().position(|l| *l == level) {
            self.counts[idx] += 1;
        }
    }

    pub fn count(&self, level: CefrLevel) -> usize {
        CefrLevel::ASSESSED
            .iter()
            .position(|l| *l == level)
            .map_or(0, |idx| self.counts[idx])
    }
}

/// Someone who answers assessment questions, typically the console.
pub trait Examinee {
    /// Shows question `number` (1-based) and blocks until an answer is given.
    fn answer(&mut self, number: usize, question: &str) -> io::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentState {
    Created,
    QuestionsGenerated,
    Administered,
    Evaluated,
    /// A phase failed; the run cannot be resumed.
    Failed,
}

impl fmt::Display for AssessmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssessmentState::Created => "created",
            AssessmentState::QuestionsGenerated => "questions generated",
            AssessmentState::Administered => "administered",
            AssessmentState::Evaluated => "evaluated",
            AssessmentState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("the examinee could not answer: {0}")]
    Input(#[from] io::Error),
    #[error("assessment is {actual}, expected {expected}")]
    OutOfOrder {
        expected: AssessmentState,
        actual: AssessmentState,
    },
}

/// A question paired with the learner's reply, if one was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry<'a> {
    pub question: &'a str,
    pub answer: Option<&'a str>,
}

/// Rebuilds question/answer pairs from a session history.
///
/// The first `question_count` turns are question generation, so their outputs
/// are the questions; the inputs of the turns after them are the answers.
pub fn transcript_from_history(history: &[Turn], question_count: usize) -> Vec<TranscriptEntry<'_>> {
    let split = question_count.min(history.len());
    let (questions, answers) = history.split_at(split);
    questions
        .iter()
        .enumerate()
        .map(|(idx, turn)| TranscriptEntry {
            question: &turn.output,
            answer: answers.get(idx).map(|turn| turn.input.as_str()),
        })
        .collect()
}

/// Renders the transcript as interleaved `Question:` / `Answer:` lines.
pub fn render_transcript(entries: &[TranscriptEntry<'_>]) -> String {
    let mut text = String::new();
    for entry in entries {
        text.push_str("Question: ");
        text.push_str(entry.question);
        text.push('\n');
        if let Some(answer) = entry.answer {
            text.push_str("Answer: ");
            text.push_str(answer);
            text.push('\n');
        }
    }
    text
}

/// One run of an assessment.
pub struct Assessment<'a> {
    strategy: AssessmentStrategy,
    language: Language,
    generator: &'a dyn TextGenerator,
    prompts: &'a PromptBook,
    session: ChatSession<'a>,
    selector: LevelSelector,
    questions: Vec<String>,
    state: AssessmentState,
}

impl<'a> Assessment<'a> {
    pub fn new(
        strategy: AssessmentStrategy,
        language: Language,
        generator: &'a dyn TextGenerator,
        prompts: &'a PromptBook,
    ) -> Self {
        Self {
            strategy,
            language,
            generator,
            prompts,
            session: ChatSession::open(generator),
            selector: LevelSelector::default(),
            questions: Vec::new(),
            state: AssessmentState::Created,
        }
    }

    pub fn state(&self) -> AssessmentState {
        self.state
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn history(&self) -> &[Turn] {
        self.session.history()
    }

    pub fn selector(&self) -> &LevelSelector {
        &self.selector
    }

    fn expect_state(&self, expected: AssessmentState) -> Result<(), AssessmentError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AssessmentError::OutOfOrder {
                expected,
                actual: self.state,
            })
        }
    }

    /// Asks the model for the strategy's questions, in order.
    ///
    /// The first failure is returned as is and fails the run; questions
    /// generated before it are kept.
    #[instrument(skip(self), fields(assessment = self.strategy.name, language = %self.language))]
    pub fn generate_questions(&mut self) -> Result<&[String], AssessmentError> {
        self.expect_state(AssessmentState::Created)?;
        if let Err(e) = self.ask_questions() {
            self.state = AssessmentState::Failed;
            return Err(e);
        }

        self.state = AssessmentState::QuestionsGenerated;
        info!(count = self.questions.len(), "Questions ready");
        Ok(&self.questions)
    }

    fn ask_questions(&mut self) -> Result<(), AssessmentError> {
        for _ in 0..self.strategy.question_count {
            let target = match self.strategy.targeting {
                LevelTargeting::RoundRobinCefr => Some(self.selector.next_target()),
                LevelTargeting::None => None,
            };
            let level = target.map_or("", CefrLevel::code);
            let prompt = self.prompts.render(
                self.strategy.question_template,
                &[("language", self.language.name()), ("level", level)],
            );

            let question = self.session.send(&prompt)?;
            self.questions.push(question);
            if let Some(level) = target {
                self.selector.record(level);
            }
            debug!(number = self.questions.len(), ?target, "Question generated");
        }
        Ok(())
    }

    /// Presents every question in order and forwards each answer to the session.
    #[instrument(skip_all, fields(assessment = self.strategy.name))]
    pub fn administer_test(&mut self, examinee: &mut dyn Examinee) -> Result<(), AssessmentError> {
        self.expect_state(AssessmentState::QuestionsGenerated)?;

        for (idx, question) in self.questions.iter().enumerate() {
            let answered = examinee
                .answer(idx + 1, question)
                .map_err(AssessmentError::from)
                .and_then(|answer| self.session.send(&answer).map_err(AssessmentError::from));
            if let Err(e) = answered {
                self.state = AssessmentState::Failed;
                return Err(e);
            }
        }

        self.state = AssessmentState::Administered;
        info!(answers = self.questions.len(), "Answers recorded");
        Ok(())
    }

    /// Asks the model to evaluate the transcript and returns its text verbatim.
    #[instrument(skip(self), fields(assessment = self.strategy.name))]
    pub fn evaluate_performance(&mut self) -> Result<String, AssessmentError> {
        self.expect_state(AssessmentState::Administered)?;

        let entries = transcript_from_history(self.session.history(), self.questions.len());
        let transcript = render_transcript(&entries);
        let prompt = self.prompts.render(
            self.strategy.evaluation_template,
            &[("language", self.language.name()), ("transcript", transcript.as_str())],
        );

        let evaluation = match self.generator.generate_once(&prompt) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                self.state = AssessmentState::Failed;
                return Err(e.into());
            }
        };
        self.state = AssessmentState::Evaluated;
        info!("Assessment evaluated");
        Ok(evaluation)
    }

    /// Runs the three phases back to back.
    pub fn run(&mut self, examinee: &mut dyn Examinee) -> Result<String, AssessmentError> {
        self.generate_questions()?;
        self.administer_test(examinee)?;
        self.evaluate_performance()
    }
}
