//! Interactive confirmation
//!
//! `rm -r` asks before deleting a directory tree. The question is routed
//! through [`Confirm`] so the shell can answer it from the same line editor
//! that reads commands, and tests can answer it from a closure.

use std::io::{self, BufRead, Write};

use crate::error::{ShellError, ShellResult};

/// Source of answers to yes/no questions.
pub trait Confirm {
    /// Show `prompt` and return one full line of input.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> io::Result<String>,
{
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self(prompt)
    }
}

/// Reads answers from standard input, one line each.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Interpret an answer: `y` is yes, `n` is no, case and surrounding
/// whitespace ignored. Anything else is rejected.
pub fn interpret_answer(answer: &str) -> ShellResult<bool> {
    let normalized = answer.trim().to_lowercase();
    match normalized.as_str() {
        "y" => Ok(true),
        "n" => Ok(false),
        _ => Err(ShellError::InvalidInput(normalized)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_answer() {
        assert!(interpret_answer("y").unwrap());
        assert!(interpret_answer(" Y\n").unwrap());
        assert!(!interpret_answer("n").unwrap());
        assert!(matches!(interpret_answer("yes"), Err(ShellError::InvalidInput(s)) if s == "yes"));
        assert!(matches!(interpret_answer(""), Err(ShellError::InvalidInput(_))));
    }

    #[test]
    fn test_closure_confirm_sees_prompt() {
        let mut seen = Vec::new();
        let mut confirm = |prompt: &str| {
            seen.push(prompt.to_string());
            Ok::<_, io::Error>("n".to_string())
        };
        assert_eq!(confirm.ask("Remove x? [y/n]: ").unwrap(), "n");
        drop(confirm);
        assert_eq!(seen, vec!["Remove x? [y/n]: "]);
    }
}
