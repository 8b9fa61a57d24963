use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{classify_read_error, ByteSource};

/// Default link speed of the sensor board.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default bound on a single blocking byte read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial port transport.
///
/// Reads one byte per call with the port's read timeout, and maps driver
/// timeouts to [`TransportError::Timeout`]. Also implements `Write` so the
/// same handle can feed a mock board on the other end of a virtual tty pair.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialSource {
    /// Open `port` at `baud_rate` with the given read timeout.
    pub fn open(port: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let handle = serialport::new(port, baud_rate)
            .timeout(read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;

        info!(port, baud_rate, ?read_timeout, "opened serial port");

        Ok(Self {
            port: handle,
            name: port.to_string(),
        })
    }
}

impl ByteSource for SerialSource {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(buf[0]),
                Err(err) => {
                    if let Some(err) = classify_read_error(err) {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn discard_input(&mut self) -> Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        self.port.clear(ClearBuffer::Input)?;
        if pending > 0 {
            debug!(port = %self.name, pending, "cleared serial input buffer");
        }
        Ok(pending)
    }
}

impl Write for SerialSource {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSource")
            .field("name", &self.name)
            .finish()
    }
}

/// A serial port visible on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    pub product: Option<String>,
}

/// Enumerate serial ports known to the OS.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let (kind, product) = match info.port_type {
                SerialPortType::UsbPort(usb) => ("usb", usb.product),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: info.port_name,
                kind,
                product,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_port_reports_port_name() {
        let err = SerialSource::open(
            "/dev/rangeplot-no-such-port",
            DEFAULT_BAUD_RATE,
            Duration::from_millis(10),
        )
        .unwrap_err();

        match err {
            TransportError::Open { port, .. } => assert_eq!(port, "/dev/rangeplot-no-such-port"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
