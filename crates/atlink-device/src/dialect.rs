use std::fmt;
use std::str::FromStr;

use atlink_modem::CommandInterface;

use crate::bg95::Bg95;
use crate::device::Device;
use crate::error::Result;
use crate::generic::GenericDevice;
use crate::n211::N211;
use crate::nrf91::Nrf91;

/// Known module families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Generic,
    Bg95,
    N211,
    Nrf91,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Self::Generic, Self::Bg95, Self::N211, Self::Nrf91];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Bg95 => "bg95",
            Self::N211 => "n211",
            Self::Nrf91 => "nrf91",
        }
    }

    /// Wrap an unstarted interface in this dialect's adapter.
    pub fn wrap(self, modem: CommandInterface) -> Result<Box<dyn Device>> {
        Ok(match self {
            Self::Generic => Box::new(GenericDevice::new(modem)),
            Self::Bg95 => Box::new(Bg95::new(modem)?),
            Self::N211 => Box::new(N211::new(modem)),
            Self::Nrf91 => Box::new(Nrf91::new(modem)),
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "bg95" | "bg96" => Ok(Self::Bg95),
            "n211" => Ok(Self::N211),
            "nrf91" => Ok(Self::Nrf91),
            other => Err(format!(
                "unknown dialect '{other}' (expected generic, bg95, n211 or nrf91)"
            )),
        }
    }
}
