//! AT command transactions for cellular IoT modules.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial ports and stream pairs behind the `Connector` trait
//! - [`frame`]: delimiter-based line framing
//! - [`modem`]: `CommandInterface` and the transaction engine
//! - [`device`]: generic, BG95, N211 and nRF91 adapters (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use atlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use atlink_frame::*;
}

/// Re-export modem types.
pub mod modem {
    pub use atlink_modem::*;
}

/// Re-export device adapters (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use atlink_device::*;
}
