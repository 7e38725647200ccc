//! Cellular module adapters built on [`atlink_modem::CommandInterface`].
//!
//! [`GenericDevice`] speaks the standard 3GPP command set. [`Bg95`], [`N211`]
//! and [`Nrf91`] wrap it and override what their firmware does differently.
//! All of them implement [`Device`].

pub mod bg95;
pub mod device;
pub mod dialect;
pub mod error;
pub mod generic;
pub mod n211;
pub mod nrf91;
pub mod types;

pub use bg95::Bg95;
pub use device::Device;
pub use dialect::Dialect;
pub use error::{DeviceError, Result};
pub use generic::{trim_quotes, GenericDevice};
pub use n211::N211;
pub use nrf91::Nrf91;
pub use types::{Apn, PdpAddress, ReceivedData, Stats};
