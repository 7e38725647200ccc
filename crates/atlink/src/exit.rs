use std::fmt;
use std::io;

use atlink_device::DeviceError;
use atlink_frame::FrameError;
use atlink_modem::ModemError;
use atlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::LineTooLong { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}

pub fn modem_error(context: &str, err: ModemError) -> CliError {
    match err {
        ModemError::Transport(err) => transport_error(context, err),
        ModemError::Frame(err) => frame_error(context, err),
        ModemError::LinkFailed(_) | ModemError::Closed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        ModemError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ModemError::CommandFailed { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        ModemError::Parse(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ModemError::InvalidToken(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Modem(err) => modem_error(context, err),
        DeviceError::Unsupported { .. }
        | DeviceError::ReservedPort(_)
        | DeviceError::UnknownSocket(_) => CliError::new(USAGE, format!("{context}: {err}")),
        DeviceError::Parse(_) | DeviceError::Hex(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        DeviceError::SocketsExhausted { .. } => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}
