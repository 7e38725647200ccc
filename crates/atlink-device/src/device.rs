use std::net::IpAddr;

use crate::error::{DeviceError, Result};
use crate::generic::GenericDevice;
use crate::types::{Apn, PdpAddress, ReceivedData, Stats};

/// Operations common to cellular modules.
///
/// Each dialect owns a [`GenericDevice`] and exposes it through
/// [`generic`](Device::generic). The provided methods delegate to it, or
/// report [`DeviceError::Unsupported`] where no standard command exists;
/// dialects override whatever their firmware does differently.
pub trait Device: Send {
    /// Short dialect name used in logs and errors.
    fn dialect(&self) -> &'static str;

    fn generic(&self) -> &GenericDevice;

    fn generic_mut(&mut self) -> &mut GenericDevice;

    /// Open the link and bring the module to a known state.
    fn start(&mut self) -> Result<()> {
        self.generic_mut().start()
    }

    fn close(&mut self) {
        self.generic_mut().close();
    }

    fn set_debug(&self, debug: bool) {
        self.generic().set_debug(debug);
    }

    /// Plain `AT` liveness check.
    fn at(&self) -> Result<()> {
        self.generic().at()
    }

    fn reboot(&self) -> Result<()> {
        Err(DeviceError::unsupported(self.dialect(), "reboot"))
    }

    /// Queue a raw line for the module without waiting for a response.
    fn send_crlf(&self, line: &str) -> Result<()> {
        self.generic().send_crlf(line)
    }

    fn imsi(&self) -> Result<String> {
        self.generic().imsi()
    }

    fn imei(&self) -> Result<String> {
        self.generic().imei()
    }

    fn ccid(&self) -> Result<String> {
        self.generic().ccid()
    }

    fn set_autoconnect(&self, _enabled: bool) -> Result<()> {
        Err(DeviceError::unsupported(self.dialect(), "autoconnect"))
    }

    fn set_apn(&self, apn: &str) -> Result<()> {
        self.generic().set_apn(apn)
    }

    fn apn(&self) -> Result<Apn> {
        self.generic().apn()
    }

    fn address(&self) -> Result<PdpAddress> {
        self.generic().address()
    }

    fn set_radio(&self, on: bool) -> Result<()> {
        self.generic().set_radio(on)
    }

    fn stats(&self) -> Result<Stats> {
        Err(DeviceError::unsupported(self.dialect(), "stats"))
    }

    /// Open a UDP socket, bound to `port` when non-zero. Returns the socket id.
    fn create_udp_socket(&mut self, _port: u16) -> Result<u32> {
        Err(DeviceError::unsupported(self.dialect(), "udp sockets"))
    }

    /// Send one datagram. Returns the number of bytes the module accepted.
    fn send_udp(&self, _socket: u32, _address: IpAddr, _port: u16, _data: &[u8]) -> Result<usize> {
        Err(DeviceError::unsupported(self.dialect(), "udp sockets"))
    }

    /// Read up to `length` bytes of the next datagram on `socket`.
    fn receive_udp(&self, _socket: u32, _length: usize) -> Result<ReceivedData> {
        Err(DeviceError::unsupported(self.dialect(), "udp sockets"))
    }

    fn close_udp_socket(&self, _socket: u32) -> Result<()> {
        Err(DeviceError::unsupported(self.dialect(), "udp sockets"))
    }
}
