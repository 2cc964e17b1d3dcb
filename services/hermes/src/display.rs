//! Console Presentation
//!
//! Menu text and word wrapping for model output.

use hermes_core::profile::Language;

/// Column at which model output is wrapped.
pub const WRAP_WIDTH: usize = 120;

pub const SEPARATOR: &str = "-----------------------------------------";

/// The welcome banner and option list.
pub fn menu(display_name: &str) -> String {
    format!(
        "\nHello, {display_name}! Welcome to the Hermes AI Language Assistant!\n\
         {SEPARATOR}\n\
         Your personal companion for learning languages.\n\n\
         Follow the options in order for the complete experience!\n\n\
         1. Register your name for a personalized experience.\n\
         2. Take the CEFR placement test to find your proficiency level.\n\
         3. Discover your learner profile with the personality test.\n\
         4. Get a study plan based on your level and profile.\n\
         5. Explore sample exercises to practice the language.\n\
         6. Quit."
    )
}

/// Prompt asking for one of the supported languages.
pub fn language_prompt() -> String {
    let names: Vec<&str> = Language::ALL.iter().map(|l| l.name()).collect();
    format!("Choose the language ({}): ", names.join(", "))
}

/// Wraps each line of `text` at `width` columns, keeping existing line breaks
/// and leading indentation. Words longer than `width` are left whole.
pub fn wrap(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| wrap_line(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let content = line.trim_start();
    if content.is_empty() {
        return line.to_string();
    }
    let indent = &line[..line.len() - content.len()];
    let options = textwrap::Options::new(width)
        .initial_indent(indent)
        .subsequent_indent(indent)
        .break_words(false)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
    textwrap::fill(content, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_breaks_long_lines_on_word_boundaries() {
        let text = "one two three four five";
        assert_eq!(wrap(text, 9), "one two\nthree\nfour five");
    }

    #[test]
    fn test_wrap_keeps_line_breaks_and_indentation() {
        let text = "Title\n\n  * alpha beta gamma";
        assert_eq!(wrap(text, 12), "Title\n\n  * alpha\n  beta gamma");
    }

    #[test]
    fn test_wrap_leaves_overlong_words_whole() {
        assert_eq!(wrap("a supercalifragilistic b", 5), "a\nsupercalifragilistic\nb");
    }

    #[test]
    fn test_wrap_keeps_long_model_output_within_width() {
        let text = "Lorem ipsum dolor sit amet ".repeat(12);
        for line in wrap(&text, WRAP_WIDTH).lines() {
            assert!(line.chars().count() <= WRAP_WIDTH, "{line}");
        }
    }

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(wrap("¿Cómo estás?", WRAP_WIDTH), "¿Cómo estás?");
    }

    #[test]
    fn test_menu_greets_by_name() {
        let menu = menu("Ana");
        assert!(menu.contains("Hello, Ana!"));
        assert!(menu.contains("6. Quit."));
    }

    #[test]
    fn test_language_prompt_lists_all_languages() {
        let prompt = language_prompt();
        for language in Language::ALL {
            assert!(prompt.contains(language.name()));
        }
    }
}
