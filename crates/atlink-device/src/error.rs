use atlink_modem::ModemError;

/// Errors returned by device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The underlying command interface failed.
    #[error(transparent)]
    Modem(#[from] ModemError),

    /// The dialect has no command for this operation.
    #[error("{operation} is not supported by {dialect}")]
    Unsupported {
        dialect: &'static str,
        operation: &'static str,
    },

    /// The transaction succeeded but its response lacked the expected data.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The port is reserved by the module firmware.
    #[error("port {0} is reserved")]
    ReservedPort(u16),

    /// Every socket slot on the module is taken.
    #[error("sockets exhausted (max {max})")]
    SocketsExhausted { max: u32 },

    /// The dialect does not know this socket id.
    #[error("unknown socket {0}")]
    UnknownSocket(u32),

    /// A hex payload from the module could not be decoded.
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl DeviceError {
    pub(crate) fn unsupported(dialect: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { dialect, operation }
    }

    /// True when the module answered with an error token.
    pub fn is_command_failed(&self) -> bool {
        matches!(self, Self::Modem(ModemError::CommandFailed { .. }))
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
