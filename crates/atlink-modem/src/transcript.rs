use std::fmt;

use tracing::{info, warn};

/// Direction of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// One line of a transaction transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub direction: Direction,
    pub text: String,
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Sent => write!(f, "> {}", self.text),
            Direction::Received => write!(f, "< {}", self.text),
        }
    }
}

/// Ordered record of what one transaction sent and received.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&mut self, text: &str) {
        self.push(Direction::Sent, text);
    }

    pub fn received(&mut self, text: &str) {
        self.push(Direction::Received, text);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Emit at info level. Used for debug-mode transcripts.
    pub fn log_debug(&self) {
        for (n, entry) in self.entries.iter().enumerate() {
            info!("[{n:2}] {entry}");
        }
    }

    /// Emit at warn level. Error transcripts go out whatever the debug flag says.
    pub fn log_failure(&self) {
        for (n, entry) in self.entries.iter().enumerate() {
            warn!("[{n:2}] {entry}");
        }
    }

    fn push(&mut self, direction: Direction, text: &str) {
        self.entries.push(TranscriptEntry {
            direction,
            text: text.to_string(),
        });
    }
}
