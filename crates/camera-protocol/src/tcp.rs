//! TCP Transport
//!
//! Used for boards behind a WiFi/Ethernet bridge (typically port 10001).

use crate::error::ProtocolError;
use crate::transport::{read_first, read_rest, Transport, TransportConfig};
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use tracing::{debug, info};

/// Blocking TCP connection to a camera board
pub struct TcpTransport {
    /// Live stream, `None` after disconnect
    stream: Option<TcpStream>,
    /// Peer address
    peer: SocketAddr,
    /// Timeouts
    config: TransportConfig,
}

impl TcpTransport {
    /// Connect to a board
    ///
    /// # Arguments
    /// * `addr` - Host and port, e.g. "192.168.1.10:10001"
    /// * `config` - Connection and read timeouts
    pub fn connect(addr: &str, config: TransportConfig) -> Result<Self, ProtocolError> {
        let peer = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ProtocolError::Io(format!("no address resolved for {}", addr)))?;

        info!("Connecting to camera board at {}", peer);
        let stream = TcpStream::connect_timeout(&peer, config.connect_timeout)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(config.write_timeout))?;

        Ok(Self {
            stream: Some(stream),
            peer,
            config,
        })
    }

    /// Close the connection
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            info!("Disconnecting from {}", self.peer);
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    /// Check if the connection is open
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, ProtocolError> {
        self.stream.as_mut().ok_or(ProtocolError::NotConnected)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn send_and_receive(
        &mut self,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ProtocolError> {
        let config = self.config.clone();
        let stream = self.stream()?;

        stream.write_all(request)?;
        stream.flush()?;

        stream.set_read_timeout(Some(config.read_timeout))?;
        let first = read_first(stream, response, config.read_timeout)?;

        stream.set_read_timeout(Some(config.idle_timeout))?;
        let total = read_rest(stream, response, first)?;

        debug!("Received {} bytes", total);
        Ok(total)
    }

    fn endpoint(&self) -> Option<String> {
        self.stream.as_ref().map(|_| self.peer.to_string())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
