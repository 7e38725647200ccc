//! Terminal token and delimiter sets.

use atlink_frame::{Delimiters, CRLF};

use crate::error::{ModemError, Result};

/// Canonical success token.
pub const OK: &str = "OK";

/// Canonical error token.
pub const ERROR: &str = "ERROR";

/// How a response line ends a transaction, if it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Success,
    Error,
}

/// Recognized success tokens, error tokens and line delimiters.
///
/// Starts with `OK`, `ERROR` and `"\r\n"`; device adapters widen it, nothing
/// narrows it.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    successes: Vec<String>,
    errors: Vec<String>,
    delimiters: Delimiters,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            successes: vec![OK.to_string()],
            errors: vec![ERROR.to_string()],
            delimiters: Delimiters::default(),
        }
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a success token. Returns `false` if already known.
    pub fn add_success(&mut self, token: &str) -> Result<bool> {
        validate_token(token)?;
        Ok(push_unique(&mut self.successes, token))
    }

    /// Add an error token. Returns `false` if already known.
    pub fn add_error(&mut self, token: &str) -> Result<bool> {
        validate_token(token)?;
        Ok(push_unique(&mut self.errors, token))
    }

    /// Add a line delimiter. Returns `false` if already known.
    pub fn add_delimiter(&mut self, delimiter: &str) -> Result<bool> {
        Ok(self.delimiters.add(delimiter)?)
    }

    /// Classify a framed line by exact match. Error tokens are checked first.
    pub fn classify(&self, line: &str) -> Option<Terminal> {
        if self.errors.iter().any(|token| token == line) {
            Some(Terminal::Error)
        } else if self.successes.iter().any(|token| token == line) {
            Some(Terminal::Success)
        } else {
            None
        }
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(ModemError::InvalidToken("token must not be empty".to_string()));
    }
    // A framed line never contains the canonical terminator, so such a token could never match.
    if token.as_bytes().windows(CRLF.len()).any(|w| w == CRLF) {
        return Err(ModemError::InvalidToken(format!(
            "token {token:?} contains a line terminator"
        )));
    }
    Ok(())
}

fn push_unique(set: &mut Vec<String>, token: &str) -> bool {
    if set.iter().any(|t| t == token) {
        return false;
    }
    set.push(token.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_canonical() {
        let v = Vocabulary::new();
        assert_eq!(v.successes(), ["OK"]);
        assert_eq!(v.errors(), ["ERROR"]);
        assert_eq!(v.delimiters().len(), 1);
    }

    #[test]
    fn exact_match_only() {
        let v = Vocabulary::new();
        assert_eq!(v.classify("OK"), Some(Terminal::Success));
        assert_eq!(v.classify("ERROR"), Some(Terminal::Error));
        assert_eq!(v.classify(" OK"), None);
        assert_eq!(v.classify("OK "), None);
        assert_eq!(v.classify("+CME ERROR: 10"), None);
        assert_eq!(v.classify("ok"), None);
    }

    #[test]
    fn adapter_tokens_extend_defaults() {
        let mut v = Vocabulary::new();
        assert!(v.add_success("SEND OK").unwrap());
        assert!(v.add_error("SEND FAIL").unwrap());

        assert_eq!(v.classify("SEND OK"), Some(Terminal::Success));
        assert_eq!(v.classify("SEND FAIL"), Some(Terminal::Error));
        assert_eq!(v.classify("OK"), Some(Terminal::Success));
        assert_eq!(v.classify("ERROR"), Some(Terminal::Error));
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut v = Vocabulary::new();
        assert!(!v.add_success("OK").unwrap());
        assert!(!v.add_error("ERROR").unwrap());
        assert!(!v.add_delimiter("\r\n").unwrap());
        assert_eq!(v.successes().len(), 1);
    }

    #[test]
    fn error_wins_when_token_in_both_sets() {
        let mut v = Vocabulary::new();
        v.add_success("ABORTED").unwrap();
        v.add_error("ABORTED").unwrap();
        assert_eq!(v.classify("ABORTED"), Some(Terminal::Error));
    }

    #[test]
    fn rejects_unmatchable_tokens() {
        let mut v = Vocabulary::new();
        assert!(matches!(v.add_success(""), Err(ModemError::InvalidToken(_))));
        assert!(matches!(
            v.add_error("BAD\r\nTOKEN"),
            Err(ModemError::InvalidToken(_))
        ));
        assert!(matches!(v.add_delimiter(""), Err(ModemError::Frame(_))));
    }
}
