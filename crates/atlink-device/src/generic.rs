use atlink_modem::{CommandInterface, ModemError};
use atlink_transport::DEFAULT_BAUD_RATE;

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::types::{Apn, PdpAddress};

const IDENTITY_MIN_DIGITS: usize = 5;
const IDENTITY_MAX_DIGITS: usize = 15;

/// Standard 3GPP command set over a [`CommandInterface`].
///
/// Works as-is with modules that follow 27.007 closely and is the base the
/// dialects build on.
#[derive(Debug)]
pub struct GenericDevice {
    modem: CommandInterface,
}

impl GenericDevice {
    pub fn new(modem: CommandInterface) -> Self {
        Self { modem }
    }

    /// Generic device on a serial port.
    pub fn serial(device: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(CommandInterface::serial(device, baud_rate))
    }

    /// Generic device on a serial port at the default baud rate.
    pub fn serial_default(device: impl Into<String>) -> Self {
        Self::serial(device, DEFAULT_BAUD_RATE)
    }

    pub fn modem(&self) -> &CommandInterface {
        &self.modem
    }

    pub fn modem_mut(&mut self) -> &mut CommandInterface {
        &mut self.modem
    }

    pub fn into_inner(self) -> CommandInterface {
        self.modem
    }

    pub fn start(&mut self) -> Result<()> {
        Ok(self.modem.start()?)
    }

    pub fn close(&mut self) {
        self.modem.close();
    }

    pub fn set_debug(&self, debug: bool) {
        self.modem.set_debug(debug);
    }

    /// Run `command`, ignoring intermediate lines.
    pub fn transact(&self, command: &str) -> Result<()> {
        Ok(self.modem.transact(command)?)
    }

    /// Run `command`, feeding intermediate lines to `on_line`.
    pub fn transact_with<F>(&self, command: &str, on_line: F) -> Result<()>
    where
        F: FnMut(&str) -> atlink_modem::Result<()>,
    {
        Ok(self.modem.transact_with(command, on_line)?)
    }

    pub fn at(&self) -> Result<()> {
        self.transact("AT")
    }

    pub fn send_crlf(&self, line: &str) -> Result<()> {
        Ok(self.modem.send_raw(line)?)
    }

    /// IMSI from `AT+CIMI`: the first run of 5 to 15 digits.
    pub fn imsi(&self) -> Result<String> {
        let mut imsi = None;
        self.transact_with("AT+CIMI", |line| {
            if let Some(digits) = identity_digits(line) {
                imsi = Some(digits.to_string());
            }
            Ok(())
        })?;
        imsi.ok_or_else(|| DeviceError::Parse("no IMSI in AT+CIMI response".to_string()))
    }

    /// IMEI from `AT+CGSN`: the last non-blank response line.
    pub fn imei(&self) -> Result<String> {
        let mut imei = None;
        self.transact_with("AT+CGSN", |line| {
            let line = line.trim();
            if !line.is_empty() {
                imei = Some(line.to_string());
            }
            Ok(())
        })?;
        imei.ok_or_else(|| DeviceError::Parse("no IMEI in AT+CGSN response".to_string()))
    }

    /// SIM ICCID from `AT+CCID` (`+CCID: <digits>`).
    pub fn ccid(&self) -> Result<String> {
        let mut ccid = None;
        self.transact_with("AT+CCID", |line| {
            if let Some(rest) = line.strip_prefix("+CCID:") {
                ccid = leading_digits(rest.trim_start()).map(str::to_string);
            }
            Ok(())
        })?;
        ccid.ok_or_else(|| DeviceError::Parse("no ICCID in AT+CCID response".to_string()))
    }

    /// Radio on (`AT+CFUN=1`) or off (`AT+CFUN=0`).
    pub fn set_radio(&self, on: bool) -> Result<()> {
        self.transact(&format!("AT+CFUN={}", u8::from(on)))
    }

    /// Define PDP context 1 with `apn` and activate it.
    pub fn set_apn(&self, apn: &str) -> Result<()> {
        self.transact(&format!("AT+CGDCONT=1,\"IP\",\"{apn}\""))?;
        self.transact("AT+CGACT=1,1")
    }

    /// Current PDP context definition from `AT+CGDCONT?`.
    pub fn apn(&self) -> Result<Apn> {
        let mut apn = Apn::default();
        self.transact_with("AT+CGDCONT?", |line| {
            if let Some(fields) = line.strip_prefix("+CGDCONT: ") {
                apn = parse_cgdcont(fields)?;
            }
            Ok(())
        })?;
        Ok(apn)
    }

    /// Context id and address from `AT+CGPADDR`.
    pub fn address(&self) -> Result<PdpAddress> {
        let mut address = PdpAddress::default();
        self.transact_with("AT+CGPADDR", |line| {
            if let Some(fields) = line.strip_prefix("+CGPADDR: ") {
                address = parse_cgpaddr(fields)?;
            }
            Ok(())
        })?;
        Ok(address)
    }
}

impl Device for GenericDevice {
    fn dialect(&self) -> &'static str {
        "generic"
    }

    fn generic(&self) -> &GenericDevice {
        self
    }

    fn generic_mut(&mut self) -> &mut GenericDevice {
        self
    }
}

/// Strip one pair of surrounding double quotes, if present.
pub fn trim_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// First run of at least 5 digits, capped at 15.
pub(crate) fn identity_digits(line: &str) -> Option<&str> {
    digit_run(line, IDENTITY_MIN_DIGITS, IDENTITY_MAX_DIGITS)
}

/// First run of at least `min` digits, truncated to `max`.
pub(crate) fn digit_run(line: &str, min: usize, max: usize) -> Option<&str> {
    let bytes = line.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let run = bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();
        if run >= min {
            return Some(&line[start..start + run.min(max)]);
        }
        start += run;
    }
    None
}

fn leading_digits(s: &str) -> Option<&str> {
    let run = s.bytes().take_while(u8::is_ascii_digit).count();
    (run > 0).then(|| &s[..run])
}

pub(crate) fn parse_context_id(field: &str) -> atlink_modem::Result<u32> {
    field
        .trim()
        .parse()
        .map_err(|_| ModemError::parse(format!("invalid context id {field:?}")))
}

pub(crate) fn parse_cgdcont(fields: &str) -> atlink_modem::Result<Apn> {
    let parts: Vec<&str> = fields.split(',').collect();
    if parts.len() < 4 {
        return Err(ModemError::parse(format!("missing fields in +CGDCONT: {fields}")));
    }
    Ok(Apn {
        context_id: parse_context_id(parts[0])?,
        pdp_type: trim_quotes(parts[1]).to_string(),
        name: trim_quotes(parts[2]).to_string(),
        address: trim_quotes(parts[3]).to_string(),
    })
}

pub(crate) fn parse_cgpaddr(fields: &str) -> atlink_modem::Result<PdpAddress> {
    let parts: Vec<&str> = fields.split(',').collect();
    if parts.len() < 2 {
        return Err(ModemError::parse(format!("missing fields in +CGPADDR: {fields}")));
    }
    Ok(PdpAddress {
        context_id: parse_context_id(parts[0])?,
        address: trim_quotes(parts[1]).to_string(),
    })
}
