use std::time::Duration;

use atlink_device::{Device, Dialect};
use atlink_modem::{CommandInterface, ModemConfig};
use atlink_transport::{SerialConnector, DEFAULT_BAUD_RATE};
use clap::{Args, Subcommand};
use tracing::debug;

use crate::exit::{device_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod apn;
pub mod at;
pub mod identity;
pub mod ports;
pub mod receive;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports.
    Ports(PortsArgs),
    /// Print IMEI, IMSI and ICCID.
    Identity(IdentityArgs),
    /// Run one raw AT command and print its response lines.
    At(AtArgs),
    /// Show, or set then show, the PDP context APN.
    Apn(ApnArgs),
    /// Send one UDP datagram through the module.
    Send(SendArgs),
    /// Read one UDP datagram from a module socket.
    Receive(ReceiveArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// How to reach the module. Shared by every command that talks to one.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, short = 'd', env = "ATLINK_DEVICE", global = true)]
    pub device: Option<String>,

    /// Baud rate.
    #[arg(long, env = "ATLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,

    /// Module dialect (generic, bg95, n211, nrf91).
    #[arg(long, env = "ATLINK_DIALECT", default_value = "generic", global = true)]
    pub dialect: Dialect,

    /// Per-line response timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,

    /// Log every transaction transcript.
    #[arg(long, global = true)]
    pub debug: bool,
}

pub fn run(command: Command, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Identity(args) => identity::run(args, connection, format),
        Command::At(args) => at::run(args, connection, format),
        Command::Apn(args) => apn::run(args, connection, format),
        Command::Send(args) => send::run(args, connection, format),
        Command::Receive(args) => receive::run(args, connection, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug, Default)]
pub struct IdentityArgs {}

#[derive(Args, Debug)]
pub struct AtArgs {
    /// Command line to send, without the trailing CRLF (e.g. AT+CSQ).
    pub command: String,
}

#[derive(Args, Debug)]
pub struct ApnArgs {
    /// APN to configure before reading the context back.
    #[arg(long, value_name = "NAME")]
    pub set: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Destination IP address.
    #[arg(long)]
    pub address: std::net::IpAddr,
    /// Destination UDP port.
    #[arg(long)]
    pub port: u16,
    /// Payload as a UTF-8 string.
    #[arg(long)]
    pub data: String,
    /// Local port to bind the socket to (0 for none).
    #[arg(long, default_value_t = 0)]
    pub local_port: u16,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Module socket id.
    #[arg(long)]
    pub socket: u32,
    /// Maximum bytes to read.
    #[arg(long, default_value_t = 512)]
    pub length: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open and start the module described by `connection`.
pub fn open_device(connection: &ConnectionArgs) -> CliResult<Box<dyn Device>> {
    let Some(path) = connection.device.as_deref() else {
        return Err(CliError::new(
            USAGE,
            "no device given (use --device or ATLINK_DEVICE)",
        ));
    };
    let line_timeout = parse_duration(&connection.timeout)?;

    let modem = CommandInterface::with_config(
        SerialConnector::new(path, connection.baud),
        ModemConfig::with_line_timeout(line_timeout),
    );
    let mut device = connection
        .dialect
        .wrap(modem)
        .map_err(|err| device_error("configure failed", err))?;
    device.set_debug(connection.debug);
    device
        .start()
        .map_err(|err| device_error(&format!("open {path} failed"), err))?;

    debug!(device = path, dialect = %connection.dialect, "module ready");
    Ok(device)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}
