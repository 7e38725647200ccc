use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Canonical AT line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Default maximum line length: 64 KiB.
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Ordered set of byte sequences that end a line.
///
/// Always contains [`CRLF`]. Sequences can be added but never removed, so
/// the canonical terminator keeps working whatever a device adapter adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    seqs: Vec<Bytes>,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            seqs: vec![Bytes::from_static(CRLF)],
        }
    }
}

impl Delimiters {
    /// The default set: just `"\r\n"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delimiter. Returns `false` if it was already present.
    pub fn add(&mut self, delimiter: impl AsRef<[u8]>) -> Result<bool> {
        let delimiter = delimiter.as_ref();
        if delimiter.is_empty() {
            return Err(FrameError::EmptyDelimiter);
        }
        if self.seqs.iter().any(|d| d.as_ref() == delimiter) {
            return Ok(false);
        }
        self.seqs.push(Bytes::copy_from_slice(delimiter));
        Ok(true)
    }

    /// Iterate delimiters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.seqs.iter().map(|d| d.as_ref())
    }

    /// Number of configured delimiters.
    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    /// Length of the longest delimiter.
    pub fn longest(&self) -> usize {
        self.seqs.iter().map(Bytes::len).max().unwrap_or(CRLF.len())
    }

    /// Always false; the canonical terminator cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// Find the leftmost delimiter occurrence in `haystack`.
    ///
    /// Returns `(offset, delimiter_len)`. When two delimiters start at the
    /// same offset the longer one wins.
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for delimiter in &self.seqs {
            let Some(pos) = find_subslice(haystack, delimiter) else {
                continue;
            };
            best = match best {
                Some((best_pos, best_len))
                    if best_pos < pos || (best_pos == pos && best_len >= delimiter.len()) =>
                {
                    Some((best_pos, best_len))
                }
                _ => Some((pos, delimiter.len())),
            };
        }
        best
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Split the next line off the front of `src`.
///
/// Returns `None` if no delimiter is buffered yet. On success the line bytes
/// (without delimiter) are returned and `src` advances past the delimiter.
pub fn split_line(src: &mut BytesMut, delimiters: &Delimiters) -> Option<Bytes> {
    let (pos, len) = delimiters.find(src)?;
    let line = src.split_to(pos).freeze();
    let _ = src.split_to(len);
    Some(line)
}

/// Decode the next line from a buffer, enforcing a maximum line length.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete line yet.
/// A line of `max_line_length` bytes may sit in the buffer together with the
/// first bytes of a delimiter that has not fully arrived.
pub fn decode_line(
    src: &mut BytesMut,
    delimiters: &Delimiters,
    max_line_length: usize,
) -> Result<Option<Bytes>> {
    Ok(decode_terminated(src, delimiters, max_line_length)?.map(|(line, _)| line))
}

/// Like [`decode_line`], but also returns the delimiter that ended the line.
pub fn decode_terminated(
    src: &mut BytesMut,
    delimiters: &Delimiters,
    max_line_length: usize,
) -> Result<Option<(Bytes, Bytes)>> {
    let max_pending = max_line_length.saturating_add(delimiters.longest() - 1);
    match delimiters.find(src) {
        Some((pos, _)) if pos > max_line_length => Err(FrameError::LineTooLong {
            size: pos,
            max: max_line_length,
        }),
        Some((pos, len)) => {
            let line = src.split_to(pos).freeze();
            let terminator = src.split_to(len).freeze();
            Ok(Some((line, terminator)))
        }
        None if src.len() > max_pending => Err(FrameError::LineTooLong {
            size: src.len(),
            max: max_line_length,
        }),
        None => Ok(None),
    }
}

/// Encode a command line: the text verbatim followed by `"\r\n"`.
pub fn encode_line(line: &str, dst: &mut BytesMut) {
    dst.reserve(line.len() + CRLF.len());
    dst.put_slice(line.as_bytes());
    dst.put_slice(CRLF);
}

/// Lossy UTF-8 view of a framed line.
pub fn line_to_string(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

/// A framed line together with the delimiter that ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line content, decoded lossily as UTF-8.
    pub text: String,
    /// The delimiter bytes consumed after the content.
    pub terminator: Bytes,
}

impl Line {
    /// Whether the line was ended by `delimiter`, e.g. a `">"` data prompt.
    pub fn ended_by(&self, delimiter: &str) -> bool {
        self.terminator.as_ref() == delimiter.as_bytes()
    }
}

/// Configuration for the line codec.
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Delimiters that end a line. Default: `"\r\n"`.
    pub delimiters: Delimiters,
    /// Maximum line length in bytes. Default: 64 KiB.
    pub max_line_length: usize,
    /// Read timeout applied to link streams.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            max_line_length: DEFAULT_MAX_LINE,
            read_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn delims(extra: &[&str]) -> Delimiters {
        let mut d = Delimiters::new();
        for e in extra {
            d.add(e).unwrap();
        }
        d
    }

    #[test]
    fn splits_on_crlf() {
        let mut buf = BytesMut::from(&b"204080813324647\r\nOK\r\n"[..]);
        let d = Delimiters::new();

        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"204080813324647");
        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"OK");
        assert!(split_line(&mut buf, &d).is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_line_waits_for_more() {
        let mut buf = BytesMut::from(&b"+CGSN: 3520"[..]);
        assert!(split_line(&mut buf, &Delimiters::new()).is_none());
        assert_eq!(buf.as_ref(), b"+CGSN: 3520");
    }

    #[test]
    fn leftmost_delimiter_wins() {
        let d = delims(&[">"]);
        let mut buf = BytesMut::from(&b"> payload\r\n"[..]);

        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"");
        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b" payload");
    }

    #[test]
    fn prompt_recognized_mid_line() {
        let d = delims(&[">"]);
        let mut buf = BytesMut::from(&b"\r\n>"[..]);

        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"");
        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"");
        assert!(buf.is_empty());
    }

    #[test]
    fn longer_delimiter_wins_tie() {
        let d = delims(&["\r"]);
        let mut buf = BytesMut::from(&b"OK\r\nNEXT\r"[..]);

        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"OK");
        assert_eq!(split_line(&mut buf, &d).unwrap().as_ref(), b"NEXT");
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_delimiter_rejected() {
        let mut d = Delimiters::new();
        assert!(matches!(d.add(""), Err(FrameError::EmptyDelimiter)));
    }

    #[test]
    fn duplicate_delimiter_ignored() {
        let mut d = Delimiters::new();
        assert!(!d.add("\r\n").unwrap());
        assert!(d.add(">").unwrap());
        assert!(!d.add(">").unwrap());
        assert_eq!(d.len(), 2);
        assert!(!d.is_empty());
    }

    #[test]
    fn decode_rejects_overlong_line() {
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        let err = decode_line(&mut buf, &Delimiters::new(), 4).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { size: 10, max: 4 }));
    }

    #[test]
    fn decode_accepts_line_at_limit() {
        let mut buf = BytesMut::from(&b"1234\r\n"[..]);
        let line = decode_line(&mut buf, &Delimiters::new(), 4).unwrap().unwrap();
        assert_eq!(line.as_ref(), b"1234");
    }

    #[test]
    fn decode_waits_for_split_delimiter_at_limit() {
        let d = Delimiters::new();
        let mut buf = BytesMut::from(&b"1234\r"[..]);
        assert!(decode_line(&mut buf, &d, 4).unwrap().is_none());

        buf.extend_from_slice(b"\n");
        assert_eq!(decode_line(&mut buf, &d, 4).unwrap().unwrap().as_ref(), b"1234");
    }

    #[test]
    fn decode_rejects_partial_beyond_delimiter_allowance() {
        let mut buf = BytesMut::from(&b"12345\r"[..]);
        let err = decode_line(&mut buf, &Delimiters::new(), 4).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { size: 6, max: 4 }));
    }

    #[test]
    fn decode_reports_matched_delimiter() {
        let d = delims(&[">"]);
        let mut buf = BytesMut::from(&b"\r\n> "[..]);

        let (line, end) = decode_terminated(&mut buf, &d, 16).unwrap().unwrap();
        assert_eq!((line.as_ref(), end.as_ref()), (&b""[..], &b"\r\n"[..]));
        let (line, end) = decode_terminated(&mut buf, &d, 16).unwrap().unwrap();
        assert_eq!((line.as_ref(), end.as_ref()), (&b""[..], &b">"[..]));
        assert_eq!(buf.as_ref(), b" ");
    }

    #[test]
    fn longest_tracks_added_delimiters() {
        let mut d = Delimiters::new();
        assert_eq!(d.longest(), 2);
        d.add(">").unwrap();
        assert_eq!(d.longest(), 2);
        d.add("+++\r").unwrap();
        assert_eq!(d.longest(), 4);
    }

    #[test]
    fn encode_appends_crlf() {
        let mut buf = BytesMut::new();
        encode_line("AT+CIMI", &mut buf);
        assert_eq!(buf.as_ref(), b"AT+CIMI\r\n");
    }

    #[test]
    fn lossy_conversion_replaces_invalid_utf8() {
        assert_eq!(line_to_string(b"ok\xff"), "ok\u{fffd}");
    }

    proptest! {
        #[test]
        fn tokens_never_contain_delimiters_and_reconstruct_input(
            input in proptest::collection::vec(
                prop_oneof![Just(b'\r'), Just(b'\n'), Just(b'>'), Just(b'@'), any::<u8>()],
                0..256,
            ),
            extra in proptest::sample::subsequence(vec![">", "@@", "\r"], 0..=3),
        ) {
            let d = delims(&extra);
            let mut buf = BytesMut::from(input.as_slice());
            let mut rebuilt = Vec::new();

            loop {
                let Some((pos, len)) = d.find(&buf) else { break };
                let delimiter = buf[pos..pos + len].to_vec();
                let token = split_line(&mut buf, &d).unwrap();
                for seq in d.iter() {
                    prop_assert!(find_subslice(&token, seq).is_none());
                }
                rebuilt.extend_from_slice(&token);
                rebuilt.extend_from_slice(&delimiter);
            }
            rebuilt.extend_from_slice(&buf);

            prop_assert_eq!(rebuilt, input);
        }
    }
}
