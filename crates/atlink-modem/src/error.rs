use std::time::Duration;

/// Errors that can occur while talking to a module.
#[derive(Debug, thiserror::Error)]
pub enum ModemError {
    /// Transport-level error (opening the link).
    #[error("transport error: {0}")]
    Transport(#[from] atlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] atlink_frame::FrameError),

    /// A background worker failed; the link is unusable.
    #[error("link failed: {0}")]
    LinkFailed(String),

    /// The interface was closed while a caller was waiting on it.
    #[error("command interface closed")]
    Closed,

    /// No terminal token arrived within the line timeout.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The module answered with an error token.
    #[error("device returned {token} for {command}")]
    CommandFailed { command: String, token: String },

    /// A response line could not be interpreted.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// `start` has not been called yet.
    #[error("command interface not started")]
    NotStarted,

    /// The operation is only valid before `start`.
    #[error("command interface already started")]
    AlreadyStarted,

    /// A success or error token was rejected.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(std::io::Error),
}

impl ModemError {
    /// Shorthand for a response parse failure.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// True for `Timeout`, which callers may want to retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, ModemError>;
