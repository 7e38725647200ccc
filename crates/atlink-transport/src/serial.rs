use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::stream::{Connector, LinkStream};

/// Baud rate most cellular modules ship with on their AT UART.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Initial read timeout on a freshly opened port.
const OPEN_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial port transport.
///
/// Opens the device 8N1 without flow control, which is what every module
/// family we talk to expects on its AT port.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    device: String,
    baud_rate: u32,
}

impl SerialConnector {
    /// Create a connector for `device` (e.g. `/dev/ttyUSB0`, `COM3`).
    pub fn new(device: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            device: device.into(),
            baud_rate,
        }
    }

    /// Device path this connector opens.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Connector for SerialConnector {
    fn connect(&self) -> Result<LinkStream> {
        let port = serialport::new(&self.device, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(OPEN_READ_TIMEOUT)
            .open()
            .map_err(|err| {
                warn!(device = %self.device, error = %err, "failed to open serial port");
                TransportError::Open {
                    device: self.device.clone(),
                    source: err.into(),
                }
            })?;

        info!(device = %self.device, baud = self.baud_rate, "opened serial port");
        Ok(LinkStream::from_serial(port))
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.device, self.baud_rate)
    }
}

/// Information about an available serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Port description (e.g., "USB Quectel BG95").
    pub description: String,
    /// USB vendor/product id, when the port is a USB device.
    pub usb_ids: Option<(u16, u16)>,
}

/// List serial ports present on the system.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|err| TransportError::Enumerate(err.to_string()))?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|port| {
            let (description, usb_ids) = match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => (
                    format!(
                        "USB {} {}",
                        usb.manufacturer.as_deref().unwrap_or("Device"),
                        usb.product.as_deref().unwrap_or("Serial Port")
                    ),
                    Some((usb.vid, usb.pid)),
                ),
                serialport::SerialPortType::BluetoothPort => ("Bluetooth Serial".to_string(), None),
                serialport::SerialPortType::PciPort => ("PCI Serial".to_string(), None),
                serialport::SerialPortType::Unknown => ("Serial Port".to_string(), None),
            };
            SerialPortInfo {
                port_name: port.port_name,
                description,
                usb_ids,
            }
        })
        .collect())
}
