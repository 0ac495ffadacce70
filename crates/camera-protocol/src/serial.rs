//! Serial Transport
//!
//! Used for boards wired directly to a UART or USB serial adapter.

use crate::error::ProtocolError;
use crate::transport::{read_first, read_rest, Transport, TransportConfig};
use std::io::Write;
use tokio_serial::SerialPort;
use tracing::{debug, info};

/// Default baud rate of the camera board UART
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Blocking serial connection to a camera board
pub struct SerialTransport {
    /// Open port, `None` after disconnect
    port: Option<Box<dyn SerialPort>>,
    /// Device path (e.g., "/dev/ttyUSB0" or "COM3")
    device: String,
    /// Timeouts
    config: TransportConfig,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `device` - Serial port device path
    /// * `baud_rate` - Baud rate for serial communication
    /// * `config` - Read timeouts
    pub fn open(device: &str, baud_rate: u32, config: TransportConfig) -> Result<Self, ProtocolError> {
        info!("Opening camera board on {} at {} baud", device, baud_rate);

        let port = tokio_serial::new(device, baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| ProtocolError::Io(e.to_string()))?;

        Ok(Self {
            port: Some(port),
            device: device.to_string(),
            config,
        })
    }

    /// Close the port
    pub fn disconnect(&mut self) {
        if self.port.take().is_some() {
            info!("Closing serial port {}", self.device);
        }
    }

    /// Check if the port is open
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ProtocolError> {
        self.port.as_mut().ok_or(ProtocolError::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn send_and_receive(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ProtocolError> {
        let config = self.config.clone();
        let port = self.port()?;

        port.write_all(request)?;
        port.flush()?;

        port.set_timeout(config.read_timeout)
            .map_err(|e| ProtocolError::Io(e.to_string()))?;
        let first = read_first(&mut **port, response, config.read_timeout)?;

        port.set_timeout(config.idle_timeout)
            .map_err(|e| ProtocolError::Io(e.to_string()))?;
        let total = read_rest(&mut **port, response, first)?;

        debug!("Received {} bytes", total);
        Ok(total)
    }

    fn endpoint(&self) -> Option<String> {
        self.port.as_ref().map(|_| self.device.clone())
    }
}
