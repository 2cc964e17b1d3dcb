//! Interactive Menu Loop
//!
//! Reads one menu choice per line and dispatches to the profile store, the
//! assessments or the study content generators. The shell is generic over its
//! console so tests can drive it with in-memory buffers.

use crate::display::{self, SEPARATOR, WRAP_WIDTH};
use anyhow::{Context, Result};
use chrono::Utc;
use hermes_core::{
    assessment::{Assessment, AssessmentStrategy, Examinee},
    curriculum::{generate_exercises, generate_learning_plan},
    llm_client::{GenerationError, TextGenerator},
    profile::{Language, LearnerProfile, ProficiencyEstimate, UserProfile},
    prompts::PromptBook,
    store::ProfileStore,
};
use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};
use tracing::{info, warn};

/// An entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ShowMenu,
    SetName,
    ProficiencyTest,
    PersonalityTest,
    LearningPlan,
    Exercises,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("'{0}' is not a menu option")]
pub struct InvalidChoice(pub String);

impl FromStr for MenuChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(MenuChoice::ShowMenu),
            "1" => Ok(MenuChoice::SetName),
            "2" => Ok(MenuChoice::ProficiencyTest),
            "3" => Ok(MenuChoice::PersonalityTest),
            "4" => Ok(MenuChoice::LearningPlan),
            "5" => Ok(MenuChoice::Exercises),
            "6" => Ok(MenuChoice::Quit),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

/// Reads one line without its terminator. `None` means the input is closed.
fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

/// Answers assessment questions from the console.
struct ConsoleExaminee<'s, R, W> {
    input: &'s mut R,
    output: &'s mut W,
}

impl<R: BufRead, W: Write> Examinee for ConsoleExaminee<'_, R, W> {
    fn answer(&mut self, number: usize, question: &str) -> io::Result<String> {
        writeln!(self.output, "{}. {}\n", number, display::wrap(question, WRAP_WIDTH))?;
        self.output.flush()?;
        read_line(self.input)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the question was answered",
            )
        })
    }
}

/// The interactive assistant.
pub struct Shell<'a, R, W> {
    input: R,
    output: W,
    generator: &'a dyn TextGenerator,
    prompts: &'a PromptBook,
    store: ProfileStore,
    profile: UserProfile,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(
        input: R,
        output: W,
        generator: &'a dyn TextGenerator,
        prompts: &'a PromptBook,
        store: ProfileStore,
        profile: UserProfile,
    ) -> Self {
        Self {
            input,
            output,
            generator,
            prompts,
            store,
            profile,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Runs the menu loop until the learner quits or the input closes.
    ///
    /// Only console and storage failures end the loop with an error.
    pub fn run(&mut self) -> Result<()> {
        self.show_menu()?;
        loop {
            writeln!(self.output, "\n{SEPARATOR}")?;
            write!(self.output, "Choose an option (0 to show the menu again): ")?;
            self.output.flush()?;

            let Some(line) = read_line(&mut self.input)? else {
                info!("Console input closed, leaving");
                break;
            };

            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(e) => {
                    writeln!(self.output, "Invalid option ({e}), please try again!")?;
                    continue;
                }
            };
            info!(?choice, "Menu choice");

            match choice {
                MenuChoice::ShowMenu => self.show_menu()?,
                MenuChoice::SetName => self.set_name()?,
                MenuChoice::ProficiencyTest => self.proficiency_test()?,
                MenuChoice::PersonalityTest => self.personality_test()?,
                MenuChoice::LearningPlan => self.learning_plan()?,
                MenuChoice::Exercises => self.exercises()?,
                MenuChoice::Quit => {
                    writeln!(self.output, "Thank you for using Hermes!")?;
                    break;
                }
            }
        }
        Ok(())
    }

    fn show_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", display::menu(self.profile.display_name()))
    }

    fn save(&self) -> Result<()> {
        self.store
            .save(&self.profile)
            .context("failed to save the learner profile")
    }

    fn set_name(&mut self) -> Result<()> {
        write!(self.output, "Enter your name: ")?;
        self.output.flush()?;
        let Some(name) = read_line(&mut self.input)? else {
            return Ok(());
        };
        self.profile.name = Some(name);
        self.save()?;
        writeln!(self.output, "Name registered successfully!")?;
        Ok(())
    }

    /// Asks for a target language. `None` if the answer is not a supported language.
    fn ask_language(&mut self) -> Result<Option<Language>> {
        write!(self.output, "{}", display::language_prompt())?;
        self.output.flush()?;
        let Some(line) = read_line(&mut self.input)? else {
            return Ok(None);
        };
        match line.parse::<Language>() {
            Ok(language) => Ok(Some(language)),
            Err(e) => {
                writeln!(self.output, "Sorry, {e}. Please choose one of the listed languages.")?;
                Ok(None)
            }
        }
    }

    fn choose_language(&mut self) -> Result<Option<Language>> {
        let Some(language) = self.ask_language()? else {
            return Ok(None);
        };
        if self.profile.target_language != Some(language) {
            self.profile.target_language = Some(language);
            self.save()?;
        }
        Ok(Some(language))
    }

    /// Generates, administers and evaluates one assessment.
    ///
    /// Model and answer failures are reported and yield `None`. Failures writing
    /// the shell's own status lines end the loop like any other console failure.
    fn run_assessment(
        &mut self,
        strategy: AssessmentStrategy,
        language: Language,
    ) -> Result<Option<String>> {
        writeln!(self.output, "\nPreparing your questions, one moment...\n")?;
        self.output.flush()?;

        let mut assessment = Assessment::new(strategy, language, self.generator, self.prompts);
        let answered = assessment.generate_questions().map(|_| ()).and_then(|()| {
            let mut examinee = ConsoleExaminee {
                input: &mut self.input,
                output: &mut self.output,
            };
            assessment.administer_test(&mut examinee)
        });
        let evaluated = match answered {
            Ok(()) => {
                writeln!(self.output, "Answers recorded. Thank you!")?;
                writeln!(self.output, "Evaluating your answers...")?;
                self.output.flush()?;
                assessment.evaluate_performance()
            }
            Err(e) => Err(e),
        };

        match evaluated {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!(assessment = strategy.name, error = %e, "Assessment aborted");
                writeln!(
                    self.output,
                    "The {} assessment could not be completed: {e}",
                    strategy.name
                )?;
                Ok(None)
            }
        }
    }

    fn proficiency_test(&mut self) -> Result<()> {
        let Some(language) = self.choose_language()? else {
            return Ok(());
        };
        let Some(summary) = self.run_assessment(AssessmentStrategy::PROFICIENCY, language)? else {
            return Ok(());
        };

        writeln!(
            self.output,
            "Assessment result: {}",
            display::wrap(&summary, WRAP_WIDTH)
        )?;
        let estimate = ProficiencyEstimate::from_summary(summary, Utc::now());
        info!(level = ?estimate.level, "Proficiency assessed");
        self.profile.proficiency = Some(estimate);
        self.save()
    }

    fn personality_test(&mut self) -> Result<()> {
        let language = match self.profile.target_language {
            Some(language) => language,
            None => {
                writeln!(self.output, "First, tell us which language you are learning.")?;
                let Some(language) = self.choose_language()? else {
                    return Ok(());
                };
                language
            }
        };
        let Some(summary) = self.run_assessment(AssessmentStrategy::PERSONALITY, language)? else {
            return Ok(());
        };

        writeln!(
            self.output,
            "Personality test result: {}",
            display::wrap(&summary, WRAP_WIDTH)
        )?;
        self.profile.learner_profile = Some(LearnerProfile::new(summary, Utc::now()));
        self.save()
    }

    fn learning_plan(&mut self) -> Result<()> {
        self.study_content(
            "Personalized study plan",
            generate_learning_plan,
        )
    }

    fn exercises(&mut self) -> Result<()> {
        self.study_content("Sample exercises", generate_exercises)
    }

    fn study_content(
        &mut self,
        heading: &str,
        generate: fn(&UserProfile, &dyn TextGenerator, &PromptBook) -> Result<String, GenerationError>,
    ) -> Result<()> {
        if !self.profile.has_name() {
            writeln!(self.output, "Please register your name first (option 1).")?;
            return Ok(());
        }

        writeln!(self.output, "\nWorking on it, one moment...")?;
        self.output.flush()?;
        match generate(&self.profile, self.generator, self.prompts) {
            Ok(text) => writeln!(
                self.output,
                "\n{heading} for {}:\n{}",
                self.profile.display_name(),
                display::wrap(&text, WRAP_WIDTH)
            )?,
            Err(e) => {
                warn!(error = %e, "Study content generation failed");
                writeln!(self.output, "Could not generate the content: {e}")?;
            }
        }
        Ok(())
    }
}
