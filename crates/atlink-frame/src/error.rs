/// Errors that can occur while framing lines.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A delimiter must contain at least one byte.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    /// No delimiter was found within the configured line budget.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// An I/O error occurred while reading or writing lines.
    #[error("line I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end of file.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
