//! u-blox SARA-N211 (NB-IoT).

use std::net::IpAddr;

use atlink_modem::CommandInterface;
use tracing::warn;

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::generic::{digit_run, identity_digits, trim_quotes, GenericDevice};
use crate::types::{ReceivedData, Stats};

/// Reserved by the module firmware for its CoAP client.
pub const RESERVED_PORT: u16 = 5683;

const ICCID_MAX_DIGITS: usize = 22;

/// SARA-N211 dialect. Payloads travel hex encoded.
#[derive(Debug)]
pub struct N211 {
    generic: GenericDevice,
}

impl N211 {
    pub fn new(modem: CommandInterface) -> Self {
        Self {
            generic: GenericDevice::new(modem),
        }
    }

    pub fn serial(device: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(CommandInterface::serial(device, baud_rate))
    }
}

impl Device for N211 {
    fn dialect(&self) -> &'static str {
        "n211"
    }

    fn generic(&self) -> &GenericDevice {
        &self.generic
    }

    fn generic_mut(&mut self) -> &mut GenericDevice {
        &mut self.generic
    }

    fn reboot(&self) -> Result<()> {
        self.generic.transact("AT+NRB")
    }

    fn imei(&self) -> Result<String> {
        let mut imei = None;
        self.generic.transact_with("AT+CGSN=1", |line| {
            if let Some(digits) = identity_digits(line) {
                imei = Some(digits.to_string());
            }
            Ok(())
        })?;
        imei.ok_or_else(|| DeviceError::Parse("no IMEI in AT+CGSN=1 response".to_string()))
    }

    fn ccid(&self) -> Result<String> {
        let mut ccid = None;
        self.generic.transact_with("AT+CCID", |line| {
            if let Some(digits) = digit_run(line, 5, ICCID_MAX_DIGITS) {
                ccid = Some(digits.to_string());
            }
            Ok(())
        })?;
        ccid.ok_or_else(|| DeviceError::Parse("no ICCID in AT+CCID response".to_string()))
    }

    fn set_autoconnect(&self, enabled: bool) -> Result<()> {
        let value = if enabled { "TRUE" } else { "FALSE" };
        self.generic
            .transact(&format!("AT+NCONFIG=\"AUTOCONNECT\",\"{value}\""))
    }

    /// Rewrites context 0. Reboots the module twice.
    fn set_apn(&self, apn: &str) -> Result<()> {
        self.set_autoconnect(false)?;
        self.reboot()?;
        self.generic
            .transact(&format!("AT+CGDCONT=0,\"IP\",\"{apn}\""))?;
        self.set_autoconnect(true)?;
        self.reboot()
    }

    /// Statistics from `AT+NUESTATS` (`"<name>",<value>` lines).
    fn stats(&self) -> Result<Stats> {
        let mut stats = Stats::default();
        self.generic.transact_with("AT+NUESTATS", |line| {
            apply_stat(&mut stats, line);
            Ok(())
        })?;
        Ok(stats)
    }

    fn create_udp_socket(&mut self, port: u16) -> Result<u32> {
        if port == RESERVED_PORT {
            return Err(DeviceError::ReservedPort(port));
        }

        let command = if port == 0 {
            "AT+NSOCR=\"DGRAM\",17".to_string()
        } else {
            format!("AT+NSOCR=\"DGRAM\",17,{port},1")
        };

        let mut socket: Option<u32> = None;
        self.generic.transact_with(&command, |line| {
            if let Ok(id) = line.trim().parse() {
                socket = Some(id);
            }
            Ok(())
        })?;
        socket.ok_or_else(|| DeviceError::Parse("no socket id in AT+NSOCR response".to_string()))
    }

    fn send_udp(&self, socket: u32, address: IpAddr, port: u16, data: &[u8]) -> Result<usize> {
        let command = format!(
            "AT+NSOST={socket},\"{address}\",{port},{},\"{}\"",
            data.len(),
            hex::encode(data)
        );

        let mut sent: usize = 0;
        self.generic.transact_with(&command, |line| {
            let fields: Vec<&str> = line.split(',').collect();
            if let [reply_socket, length] = fields.as_slice() {
                let reply_socket: u32 = parse_field(reply_socket, "socket")?;
                sent = parse_field(length, "length")?;
                if reply_socket != socket {
                    warn!(socket, reply_socket, "AT+NSOST answered for a different socket");
                }
            }
            Ok(())
        })?;
        Ok(sent)
    }

    /// Reads via `AT+NSORF`. A `+NSONMI` URC announces pending data.
    fn receive_udp(&self, socket: u32, length: usize) -> Result<ReceivedData> {
        let mut received = ReceivedData::default();
        let mut payload = String::new();

        self.generic
            .transact_with(&format!("AT+NSORF={socket},{length}"), |line| {
                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() < 6 {
                    return Ok(());
                }
                received.socket = parse_field(fields[0], "socket")?;
                received.ip = trim_quotes(fields[1]).to_string();
                received.port = parse_field(fields[2], "port")?;
                received.length = parse_field(fields[3], "length")?;
                payload = trim_quotes(fields[4]).to_string();
                received.remaining = parse_field(fields[5], "remaining")?;
                Ok(())
            })?;

        received.data = hex::decode(payload)?;
        Ok(received)
    }

    fn close_udp_socket(&self, socket: u32) -> Result<()> {
        self.generic.transact(&format!("AT+NSOCL={socket}"))
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str) -> atlink_modem::Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| atlink_modem::ModemError::parse(format!("invalid {name} {field:?}")))
}

/// Unknown names and unparsable values are skipped.
fn apply_stat(stats: &mut Stats, line: &str) {
    let Some((name, value)) = line.split_once(',') else {
        return;
    };
    let Ok(value) = value.trim().parse::<i64>() else {
        return;
    };
    let narrow = i32::try_from(value).ok();

    match (trim_quotes(name), narrow) {
        ("Signal power", Some(v)) => stats.signal_power = v,
        ("Total power", Some(v)) => stats.total_power = v,
        ("TX power", Some(v)) => stats.tx_power = v,
        ("TX time", _) => stats.tx_time = value,
        ("RX time", _) => stats.rx_time = value,
        ("Cell ID", _) => stats.cell_id = value,
        ("ECL", Some(v)) => stats.ecl = v,
        ("SNR", Some(v)) => stats.snr = v,
        ("EARFCN", Some(v)) => stats.earfcn = v,
        ("PCI", Some(v)) => stats.pci = v,
        ("RSRQ", Some(v)) => stats.rsrq = v,
        _ => {}
    }
}
