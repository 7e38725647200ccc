/// Errors that can occur in modem transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the specified device.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        source: std::io::Error,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(String),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connector cannot hand out another stream.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
