use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_line, encode_line, line_to_string, Delimiters, LineConfig};
use crate::error::FrameError;

/// `tokio_util` codec over the same delimiter rules as [`crate::LineReader`].
///
/// Decodes lossy UTF-8 lines; encodes commands with a trailing `"\r\n"`.
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    config: LineConfig,
}

impl LineCodec {
    /// Codec with the default `"\r\n"` delimiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with explicit configuration.
    pub fn with_config(config: LineConfig) -> Self {
        Self { config }
    }

    /// Current delimiter set.
    pub fn delimiters(&self) -> &Delimiters {
        &self.config.delimiters
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let line = decode_line(src, &self.config.delimiters, self.config.max_line_length)?;
        Ok(line.map(|line| line_to_string(&line)))
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_line(item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn framed_read_splits_lines() {
        let (mut modem, host) = tokio::io::duplex(64);
        let mut lines = FramedRead::new(host, LineCodec::new());

        modem
            .write_all(b"204080813324647\r\nOK\r\n")
            .await
            .unwrap();

        assert_eq!(lines.next().await.unwrap().unwrap(), "204080813324647");
        assert_eq!(lines.next().await.unwrap().unwrap(), "OK");
    }

    #[tokio::test]
    async fn framed_read_honours_extra_delimiters() {
        let mut config = LineConfig::default();
        config.delimiters.add(">").unwrap();
        let (mut modem, host) = tokio::io::duplex(64);
        let mut lines = FramedRead::new(host, LineCodec::with_config(config));

        modem.write_all(b"\r\n>").await.unwrap();

        assert_eq!(lines.next().await.unwrap().unwrap(), "");
        assert_eq!(lines.next().await.unwrap().unwrap(), "");
    }

    #[tokio::test]
    async fn framed_write_appends_crlf() {
        let (host, mut modem) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(host, LineCodec::new());

        sink.send("AT+CGATT?").await.unwrap();

        let mut buf = [0u8; 11];
        modem.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"AT+CGATT?\r\n");
    }
}
