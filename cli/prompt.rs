use colored::*;
use std::io::{self, BufRead, Write};

/// Source of interactive answers.
pub trait Prompter {
    /// Shows `prompt` and returns the answer without its line ending, or
    /// `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdinPrompter {
    styled: bool,
}

impl StdinPrompter {
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }
}

impl Prompter for StdinPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        if self.styled {
            write!(stdout, "{}", prompt.yellow().bold())?;
        } else {
            write!(stdout, "{}", prompt)?;
        }
        stdout.flush()?;

        let mut response = String::new();
        if io::stdin().lock().read_line(&mut response)? == 0 {
            return Ok(None);
        }
        Ok(Some(response.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Yes/no question; Enter picks `default`.
pub fn confirm(prompter: &mut dyn Prompter, question: &str, default: bool) -> io::Result<Option<bool>> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let Some(answer) = prompter.read_line(&format!("{} {}: ", question, hint))? else {
        return Ok(None);
    };
    let answer = answer.trim().to_lowercase();
    Ok(Some(match answer.as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }))
}

/// Free-text question; Enter (or only whitespace) picks `default`.
pub fn ask_with_default(
    prompter: &mut dyn Prompter,
    question: &str,
    default: &str,
) -> io::Result<Option<String>> {
    let Some(answer) = prompter.read_line(&format!("{} (default: {}): ", question, default))? else {
        return Ok(None);
    };
    let answer = answer.trim();
    Ok(Some(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    }))
}
