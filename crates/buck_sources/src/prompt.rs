//! Operator confirmation

use std::io::{self, BufRead, Write};

/// Yes/no question to whoever is driving the resolution.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Asks on stderr, answers from stdin. Only `y`/`yes` count as consent.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{} [y/N] ", question);
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(bytes_read) if bytes_read > 0 => is_yes(&answer),
            _ => false,
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
