//! Byte-stream transports for AT command modems.
//!
//! Provides a unified interface over the links a cellular module can sit on:
//! - Serial ports (USB CDC, UART adapters) via the `serialport` crate
//! - Unix stream pairs (virtual modems, tests)
//!
//! This is the lowest layer of atlink. Everything else builds on top of
//! the [`LinkStream`] type and the [`Connector`] trait provided here.

pub mod error;
pub mod serial;
pub mod stream;

pub use error::{Result, TransportError};
pub use serial::{list_ports, SerialConnector, SerialPortInfo, DEFAULT_BAUD_RATE};
pub use stream::{Connector, LinkStream};

#[cfg(unix)]
pub use stream::StreamConnector;
