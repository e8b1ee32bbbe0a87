//! # Serial Link Module
//!
//! Opening the serial connection to the HC-06 and finding it among the
//! system's ports. Once paired, the module shows up as an ordinary serial
//! device (`COM5`, `/dev/rfcomm0`, `/dev/cu.HC-06-DevB`, ...), so the link
//! is just a `serialport` handle.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPortType;

use crate::error::{Error, Result};

/// Default baud rate of an HC-06 module out of the box.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Marker the module reports in its port description.
const HC06_MARKER: &str = "HC-06";

/// Write timeout for the serial handle.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens connections to a device by address.
///
/// The player is generic over this so tests can swap in an in-memory link.
pub trait Connector {
    type Port: Write + Send;

    fn open(&self, address: &str, baud_rate: u32) -> Result<Self::Port>;
}

/// Opens real serial ports through the `serialport` crate.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    timeout: Duration,
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self {
            timeout: WRITE_TIMEOUT,
        }
    }
}

impl Connector for SerialConnector {
    type Port = Box<dyn serialport::SerialPort>;

    fn open(&self, address: &str, baud_rate: u32) -> Result<Self::Port> {
        tracing::info!("Opening serial port {} at {} baud", address, baud_rate);
        serialport::new(address, baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })
    }
}

/// A serial port as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name to open (e.g. `COM5`).
    pub device: String,
    /// Human-readable description, empty when the OS gives none.
    pub description: String,
}

impl PortInfo {
    fn from_serialport(info: serialport::SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => [usb.manufacturer, usb.product]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::PciPort | SerialPortType::Unknown => String::new(),
        };
        Self {
            device: info.port_name,
            description,
        }
    }

    fn is_hc06(&self) -> bool {
        self.description.contains(HC06_MARKER) || self.device.contains(HC06_MARKER)
    }
}

/// Lists all serial ports on the system.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(Error::PortScan)?;
    Ok(ports.into_iter().map(PortInfo::from_serialport).collect())
}

/// Returns the device name of the first HC-06 among the system's ports.
pub fn find_hc06() -> Result<Option<String>> {
    let ports = list_ports()?;
    tracing::debug!("Scanned {} serial ports for an HC-06", ports.len());
    Ok(find_hc06_in(&ports))
}

/// Picks the first HC-06 out of an already listed set of ports.
pub fn find_hc06_in(ports: &[PortInfo]) -> Option<String> {
    ports.iter().find(|p| p.is_hc06()).map(|p| p.device.clone())
}
