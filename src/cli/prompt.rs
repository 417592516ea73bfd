use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    matching::{Disambiguator, MatchCandidate, Selection},
    types::LocalTrack,
    utils, warning,
};

const PROMPT: &str = "number, or text to search for> ";
const EMPTY_PROMPT: &str = "custom search, or enter to skip> ";

/// Asks on the terminal which candidate matches.
#[derive(Debug, Default)]
pub struct ConsoleDisambiguator;

impl ConsoleDisambiguator {
    pub fn new() -> Self {
        Self
    }
}

/// Interprets one answer. `None` means the answer was unusable and the
/// question should be repeated.
pub fn parse_answer(line: &str, option_count: usize) -> Option<Selection> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.parse::<usize>() {
        Ok(n) if n < option_count => Some(Selection::Pick(n)),
        Ok(n) if n == option_count => Some(Selection::NoneOfTheAbove),
        Ok(_) => None,
        Err(_) => Some(Selection::CustomSearch(line.to_string())),
    }
}

fn read_line(prompt: &str) -> Option<String> {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            warning!("Cannot read from terminal: {}", e);
            return None;
        }
    };

    match rl.readline(prompt) {
        Ok(line) => Some(line),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
        Err(e) => {
            warning!("Cannot read from terminal: {}", e);
            None
        }
    }
}

impl Disambiguator for ConsoleDisambiguator {
    fn choose(&mut self, local: &LocalTrack, options: &[MatchCandidate]) -> Selection {
        if options.is_empty() {
            println!("no matches found for: {}", utils::render_local(local));
            return match read_line(EMPTY_PROMPT) {
                Some(text) if !text.trim().is_empty() => {
                    Selection::CustomSearch(text.trim().to_string())
                }
                _ => Selection::NoneOfTheAbove,
            };
        }

        println!(
            "which of the following best matches: {}?",
            utils::render_local(local)
        );
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}) {}", i, option.option_label());
        }
        println!("  {:>2}) none of the above", options.len());

        loop {
            let Some(line) = read_line(PROMPT) else {
                return Selection::NoneOfTheAbove;
            };
            match parse_answer(&line, options.len()) {
                Some(selection) => return selection,
                None => println!("pick 0 to {} or type a search", options.len()),
            }
        }
    }
}
