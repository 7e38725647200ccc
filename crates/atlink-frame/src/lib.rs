//! Delimiter-based line framing for AT command streams.
//!
//! Modules answer commands with text lines. Most lines end in `"\r\n"`, but
//! some devices emit other separators in certain states (a `">"` prompt when
//! waiting for payload, for instance). This crate splits a byte stream on a
//! configurable set of delimiters, leftmost match first:
//! - [`LineReader`] pulls complete lines out of any `Read`
//! - [`LineWriter`] writes commands terminated by `"\r\n"`
//! - `LineCodec` (behind the `async` feature) does both for tokio streams
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    decode_line, decode_terminated, encode_line, split_line, Delimiters, Line, LineConfig, CRLF,
    DEFAULT_MAX_LINE,
};
pub use error::{FrameError, Result};
pub use reader::LineReader;
pub use writer::{LineWriter, MAX_STALLED_WRITES};

#[cfg(feature = "async")]
pub use tokio_codec::LineCodec;
