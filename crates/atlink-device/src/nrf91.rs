//! Nordic nRF91 running the serial LTE modem application.

use std::net::IpAddr;

use atlink_modem::{CommandInterface, ModemError};

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::generic::{trim_quotes, GenericDevice};
use crate::types::ReceivedData;

/// The serial LTE modem application exposes one socket, always id 1.
pub const SOCKET_ID: u32 = 1;

/// Seconds `AT#XRECVFROM` waits for a datagram.
pub const RECEIVE_TIMEOUT_SECS: u32 = 10;

/// nRF91 dialect.
#[derive(Debug)]
pub struct Nrf91 {
    generic: GenericDevice,
}

impl Nrf91 {
    pub fn new(modem: CommandInterface) -> Self {
        Self {
            generic: GenericDevice::new(modem),
        }
    }

    pub fn serial(device: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(CommandInterface::serial(device, baud_rate))
    }

    fn check_socket(socket: u32) -> Result<()> {
        if socket != SOCKET_ID {
            return Err(DeviceError::UnknownSocket(socket));
        }
        Ok(())
    }
}

impl Device for Nrf91 {
    fn dialect(&self) -> &'static str {
        "nrf91"
    }

    fn generic(&self) -> &GenericDevice {
        &self.generic
    }

    fn generic_mut(&mut self) -> &mut GenericDevice {
        &mut self.generic
    }

    /// ICCID from `AT%XICCID` (`%XICCID: <iccid>`).
    fn ccid(&self) -> Result<String> {
        let mut ccid = None;
        self.generic.transact_with("AT%XICCID", |line| {
            if line.trim().is_empty() {
                return Ok(());
            }
            match line.split_once(':') {
                Some((_, value)) if !value.contains(':') => {
                    ccid = Some(value.trim().to_string());
                    Ok(())
                }
                _ => Err(ModemError::parse(format!("unable to parse AT%XICCID response: {line}"))),
            }
        })?;
        ccid.ok_or_else(|| DeviceError::Parse("no ICCID in AT%XICCID response".to_string()))
    }

    /// Opens the IPv4 UDP client socket, bound to `port` when non-zero.
    fn create_udp_socket(&mut self, port: u16) -> Result<u32> {
        self.generic.transact("AT#XSOCKET=1,2,0")?;
        if port != 0 {
            self.generic.transact(&format!("AT#XBIND={port}"))?;
        }
        Ok(SOCKET_ID)
    }

    fn send_udp(&self, socket: u32, address: IpAddr, port: u16, data: &[u8]) -> Result<usize> {
        Self::check_socket(socket)?;

        let mut sent: usize = 0;
        self.generic.transact_with(
            &format!(
                "AT#XSENDTO=\"{address}\",{port},0,\"{}\"",
                hex::encode(data)
            ),
            |line| {
                if line.trim().is_empty() {
                    return Ok(());
                }
                let Some((_, count)) = line.split_once(':') else {
                    return Err(ModemError::parse(format!("unknown AT#XSENDTO response: {line}")));
                };
                sent = count
                    .trim()
                    .parse()
                    .map_err(|_| ModemError::parse(format!("invalid byte count in {line:?}")))?;
                Ok(())
            },
        )?;
        Ok(sent)
    }

    /// Waits up to ten seconds for one datagram. The payload line arrives
    /// before `#XRECVFROM: <size>,"<ip>"`.
    fn receive_udp(&self, socket: u32, _length: usize) -> Result<ReceivedData> {
        Self::check_socket(socket)?;

        let mut received = ReceivedData::default();
        self.generic.transact_with(
            &format!("AT#XRECVFROM={RECEIVE_TIMEOUT_SECS}"),
            |line| {
                if let Some(fields) = line.strip_prefix("#XRECVFROM:") {
                    let Some((size, ip)) = fields.split_once(',') else {
                        return Err(ModemError::parse(format!(
                            "could not parse size and address in {line:?}"
                        )));
                    };
                    received.length = size
                        .trim()
                        .parse()
                        .map_err(|_| ModemError::parse(format!("invalid size in {line:?}")))?;
                    received.ip = trim_quotes(ip.trim()).to_string();
                } else {
                    received.data = line.as_bytes().to_vec();
                    received.socket = SOCKET_ID;
                }
                Ok(())
            },
        )?;
        Ok(received)
    }

    fn close_udp_socket(&self, socket: u32) -> Result<()> {
        Self::check_socket(socket)?;
        self.generic.transact("AT#XSOCKET=0")
    }
}
