use std::io::{ErrorKind, Read};

use atlink_transport::LinkStream;
use bytes::BytesMut;

use crate::codec::{decode_terminated, line_to_string, Delimiters, Line, LineConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete lines from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete lines.
/// Bytes after the last delimiter stay buffered across calls, including
/// across read errors such as timeouts.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    config: LineConfig,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, LineConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: LineConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete line (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// Read timeouts surface as `FrameError::Io` with kind `TimedOut` or
    /// `WouldBlock`; the partial line stays buffered.
    pub fn read_line(&mut self) -> Result<String> {
        self.read_terminated().map(|line| line.text)
    }

    /// Read the next complete line and the delimiter that ended it.
    pub fn read_terminated(&mut self) -> Result<Line> {
        loop {
            if let Some((line, terminator)) = decode_terminated(
                &mut self.buf,
                &self.config.delimiters,
                self.config.max_line_length,
            )? {
                return Ok(Line {
                    text: line_to_string(&line),
                    terminator,
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet terminated by a delimiter.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current delimiter set.
    pub fn delimiters(&self) -> &Delimiters {
        &self.config.delimiters
    }

    /// Current line reader configuration.
    pub fn config(&self) -> &LineConfig {
        &self.config
    }
}

impl LineReader<LinkStream> {
    /// Create a line reader for a `LinkStream` and apply the read timeout from config.
    pub fn for_link(mut inner: LinkStream, config: LineConfig) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner
                .set_read_timeout(timeout)
                .map_err(transport_to_frame_error)?;
        }
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: atlink_transport::TransportError) -> FrameError {
    match err {
        atlink_transport::TransportError::Io(io) => FrameError::Io(io),
        atlink_transport::TransportError::Open { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
