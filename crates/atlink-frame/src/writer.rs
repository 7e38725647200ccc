use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_line;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Consecutive write timeouts tolerated before a line is abandoned. Serial
/// ports carry a short timeout for the reader's poll, which writes share.
pub const MAX_STALLED_WRITES: u32 = 50;

/// Writes command lines to any `Write` stream.
///
/// Every line goes out verbatim followed by `"\r\n"`, then the stream is
/// flushed so the module sees the command immediately.
pub struct LineWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> LineWriter<T> {
    /// Create a new line writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write one line followed by the canonical terminator (blocking).
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.buf.clear();
        encode_line(line, &mut self.buf);

        let mut offset = 0usize;
        let mut stalled = 0u32;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    offset += n;
                    stalled = 0;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut && stalled < MAX_STALLED_WRITES => {
                    stalled += 1;
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        let mut stalled = 0u32;
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut && stalled < MAX_STALLED_WRITES => {
                    stalled += 1;
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn write_single_line() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_line("AT+CIMI").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, b"AT+CIMI\r\n");
    }

    #[test]
    fn write_multiple_lines_in_order() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_line("ATE0").unwrap();
        writer.write_line("AT+CGSN").unwrap();
        writer.write_line("").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, b"ATE0\r\nAT+CGSN\r\n\r\n");
    }

    #[test]
    fn line_content_is_not_escaped() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_line("AT+QISEND=1,5\r\nhello").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, b"AT+QISEND=1,5\r\nhello\r\n");
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = LineWriter::new(sink);

        writer.write_line("AT").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_and_would_block_writes() {
        let writer_impl = FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        };

        let mut writer = LineWriter::new(writer_impl);
        writer.write_line("AT+CFUN=1").unwrap();

        assert_eq!(writer.into_inner().data, b"AT+CFUN=1\r\n");
    }

    #[test]
    fn transient_write_timeout_is_retried() {
        let writer_impl = FlakyWriter {
            failures: vec![ErrorKind::TimedOut],
            data: Vec::new(),
        };

        let mut writer = LineWriter::new(writer_impl);
        writer.write_line("AT+QISEND=1,5").unwrap();

        assert_eq!(writer.into_inner().data, b"AT+QISEND=1,5\r\n");
    }

    #[test]
    fn persistent_write_timeout_fails() {
        let writer_impl = FlakyWriter {
            failures: vec![ErrorKind::TimedOut; MAX_STALLED_WRITES as usize + 1],
            data: Vec::new(),
        };

        let mut writer = LineWriter::new(writer_impl);
        let err = writer.write_line("AT").unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::TimedOut));
        assert!(writer.into_inner().data.is_empty());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = LineWriter::new(ZeroWriter);
        let err = writer.write_line("AT").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn broken_pipe_is_reported() {
        let mut writer = LineWriter::new(BrokenWriter);
        let err = writer.write_line("AT").unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn written_lines_decode() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_line("AT+CGDCONT?").unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = crate::reader::LineReader::new(Cursor::new(wire));
        assert_eq!(reader.read_line().unwrap(), "AT+CGDCONT?");
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = LineWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.failures.pop() {
                return Err(std::io::Error::from(kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
