use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A connected modem link. Implements Read + Write.
///
/// This is the fundamental I/O type returned by [`Connector::connect`].
/// It wraps either a serial port or, on Unix, one end of a stream pair.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    Serial(Box<dyn serialport::SerialPort>),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    /// Wrap an opened serial port.
    pub fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: LinkStreamInner::Serial(port),
        }
    }

    /// Wrap one end of a Unix stream pair.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Set the read timeout on the underlying stream.
    ///
    /// Reads that hit the timeout fail with `TimedOut` (serial) or
    /// `WouldBlock` (Unix).
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            LinkStreamInner::Serial(port) => port
                .set_timeout(timeout)
                .map_err(|err| TransportError::Io(err.into())),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => {
                stream.set_read_timeout(Some(timeout)).map_err(Into::into)
            }
        }
    }

    /// Try to clone this stream (creates a new handle to the same link).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            LinkStreamInner::Serial(port) => {
                let cloned = port
                    .try_clone()
                    .map_err(|err| TransportError::Io(err.into()))?;
                Ok(Self::from_serial(cloned))
            }
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }

    /// Shut the link down so blocked readers on other handles wake up.
    ///
    /// Serial ports have no shutdown primitive; readers there rely on the
    /// read timeout instead.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            LinkStreamInner::Serial(_) => Ok(()),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => match stream.shutdown(std::net::Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            LinkStreamInner::Serial(port) => f
                .debug_struct("LinkStream")
                .field("type", &"serial")
                .field("name", &port.name())
                .finish(),
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => f.debug_struct("LinkStream").field("type", &"unix").finish(),
        }
    }
}

/// Opens the link a command interface talks over.
pub trait Connector: Send + Sync {
    /// Open the link.
    fn connect(&self) -> Result<LinkStream>;

    /// Human-readable identifier for logs (device path, "stream-pair", ...).
    fn describe(&self) -> String;
}

/// Hands out a pre-built Unix stream exactly once.
///
/// Used to run a command interface against an in-process virtual modem.
#[cfg(unix)]
pub struct StreamConnector {
    stream: std::sync::Mutex<Option<std::os::unix::net::UnixStream>>,
}

#[cfg(unix)]
impl StreamConnector {
    /// Wrap one end of a stream pair.
    pub fn new(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            stream: std::sync::Mutex::new(Some(stream)),
        }
    }
}

#[cfg(unix)]
impl Connector for StreamConnector {
    fn connect(&self) -> Result<LinkStream> {
        let mut slot = self
            .stream
            .lock()
            .map_err(|_| TransportError::Unavailable("stream connector poisoned".to_string()))?;
        slot.take()
            .map(LinkStream::from_unix)
            .ok_or_else(|| TransportError::Unavailable("stream already connected".to_string()))
    }

    fn describe(&self) -> String {
        "stream-pair".to_string()
    }
}
