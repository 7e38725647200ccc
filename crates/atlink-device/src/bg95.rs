//! Quectel BG95/BG96.

use std::net::IpAddr;

use atlink_modem::{CommandInterface, ModemError};
use tracing::debug;

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::generic::GenericDevice;

/// Highest connection id `AT+QIOPEN` accepts.
pub const MAX_SOCKETS: u32 = 11;

const PROMPT: &str = ">";

/// Quectel BG95 dialect.
///
/// The module answers `AT+QISEND` with a bare `>` prompt before taking the
/// payload and ends it with `SEND OK` or `SEND FAIL`.
#[derive(Debug)]
pub struct Bg95 {
    generic: GenericDevice,
    last_socket: u32,
}

impl Bg95 {
    /// Wrap an interface that has not been started yet.
    pub fn new(mut modem: CommandInterface) -> Result<Self> {
        modem.add_error_token("SEND FAIL")?;
        modem.add_delimiter(PROMPT)?;
        modem.add_success_token("SEND OK")?;
        Ok(Self {
            generic: GenericDevice::new(modem),
            last_socket: 0,
        })
    }

    pub fn serial(device: impl Into<String>, baud_rate: u32) -> Result<Self> {
        Self::new(CommandInterface::serial(device, baud_rate))
    }
}

impl Device for Bg95 {
    fn dialect(&self) -> &'static str {
        "bg95"
    }

    fn generic(&self) -> &GenericDevice {
        &self.generic
    }

    fn generic_mut(&mut self) -> &mut GenericDevice {
        &mut self.generic
    }

    /// Starts the link and turns command echo off.
    fn start(&mut self) -> Result<()> {
        self.generic.start()?;
        self.generic.transact("ATE0")
    }

    /// ICCID from a `<key>: <iccid>` response line.
    fn ccid(&self) -> Result<String> {
        let mut ccid = None;
        self.generic.transact_with("AT+CCID", |line| {
            if line.trim().is_empty() {
                return Ok(());
            }
            let mut parts = line.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(_), Some(value), None) => {
                    ccid = Some(value.trim().to_string());
                    Ok(())
                }
                _ => Err(ModemError::parse(format!("unable to parse AT+CCID response: {line}"))),
            }
        })?;
        ccid.ok_or_else(|| DeviceError::Parse("no ICCID in AT+CCID response".to_string()))
    }

    fn create_udp_socket(&mut self, port: u16) -> Result<u32> {
        let requested = self.last_socket + 1;
        if requested > MAX_SOCKETS {
            return Err(DeviceError::SocketsExhausted { max: MAX_SOCKETS });
        }
        self.last_socket = requested;

        let mut opened = requested;
        self.generic.transact_with(
            &format!("AT+QIOPEN=1,{requested},\"UDP SERVICE\",\"0.0.0.0\",{port},1"),
            |line| {
                if let Some(result) = line.strip_prefix("+QIOPEN:") {
                    opened = parse_qiopen(result)?;
                }
                Ok(())
            },
        )?;

        self.last_socket = opened;
        debug!(socket = opened, port, "bg95 socket opened");
        Ok(opened)
    }

    /// Sends the payload once the `>` prompt arrives. Binary payloads that
    /// contain a line terminator are not supported by this path.
    fn send_udp(&self, socket: u32, address: IpAddr, port: u16, data: &[u8]) -> Result<usize> {
        let payload = String::from_utf8_lossy(data);
        let modem = self.generic.modem();
        let mut prompted = false;

        modem.transact_lines(
            &format!("AT+QISEND={socket},{},\"{address}\",{port}", data.len()),
            |line| {
                if !prompted && line.ended_by(PROMPT) {
                    prompted = true;
                    modem.send_raw(&payload)?;
                }
                Ok(())
            },
        )?;

        if !prompted {
            return Err(DeviceError::Parse("no data prompt after AT+QISEND".to_string()));
        }
        Ok(data.len())
    }

    fn close_udp_socket(&self, socket: u32) -> Result<()> {
        self.generic.transact(&format!("AT+QICLOSE={socket}"))
    }
}

/// `<connection id>,<error>`; a non-zero error is a failed open.
fn parse_qiopen(fields: &str) -> atlink_modem::Result<u32> {
    let parts: Vec<&str> = fields.split(',').map(str::trim).collect();
    let [id, code] = parts.as_slice() else {
        return Err(ModemError::parse(format!("expected 2 fields in +QIOPEN:{fields}")));
    };
    let id = id
        .parse()
        .map_err(|_| ModemError::parse(format!("invalid connection id in +QIOPEN:{fields}")))?;
    if *code != "0" {
        return Err(ModemError::parse(format!("module refused socket open, error {code}")));
    }
    Ok(id)
}
