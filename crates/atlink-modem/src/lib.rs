//! Synchronous AT command transactions over a line-oriented link.
//!
//! A [`CommandInterface`] owns the link to one module. `start` launches a
//! reader thread that frames incoming bytes into lines and a writer thread
//! that sends command lines; `transact` sends one command and reads lines
//! until a success token, an error token, a callback failure or a timeout.

pub mod config;
pub mod error;
pub mod interface;
pub mod transcript;
#[cfg(all(unix, any(test, feature = "testing")))]
pub mod virtual_modem;
pub mod vocabulary;
mod worker;

pub use atlink_frame::Line;
pub use config::{ModemConfig, DEFAULT_LINE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use error::{ModemError, Result};
pub use interface::CommandInterface;
pub use transcript::{Direction, Transcript, TranscriptEntry};
#[cfg(all(unix, any(test, feature = "testing")))]
pub use virtual_modem::VirtualModem;
pub use vocabulary::{Terminal, Vocabulary, ERROR, OK};
