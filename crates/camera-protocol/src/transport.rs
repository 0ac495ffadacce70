//! Transport Abstraction

use crate::error::ProtocolError;
use std::io::{ErrorKind, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A connection to the camera board
///
/// Implementations block; callers own the threading.
pub trait Transport: Send {
    /// Write a command that the board does not answer
    fn send(&mut self, bytes: &[u8]) -> Result<(), ProtocolError>;

    /// Write a request and read its response into `response`
    ///
    /// Returns the number of bytes written into `response`. Transport
    /// failures are reported as errors, never as a short count.
    fn send_and_receive(&mut self, request: &[u8], response: &mut [u8])
        -> Result<usize, ProtocolError>;

    /// Identity of the connected peer, or `None` when not connected
    fn endpoint(&self) -> Option<String>;
}

/// Transport handle shared by the control context and the capture worker
pub type SharedTransport = Arc<Mutex<dyn Transport>>;

/// Timeouts applied by the blocking transports
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Wait for the first byte of a response
    pub read_timeout: Duration,
    /// Quiet period that ends a response
    pub idle_timeout: Duration,
    /// Write timeout
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_millis(50),
            write_timeout: Duration::from_secs(2),
        }
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Read the first chunk of a response, mapping a timeout to `ProtocolError::Timeout`
pub(crate) fn read_first<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<usize, ProtocolError> {
    loop {
        match reader.read(buf) {
            Ok(0) => return Err(ProtocolError::Io("connection closed by peer".to_string())),
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(e.kind()) => {
                return Err(ProtocolError::Timeout(timeout.as_millis() as u64))
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Keep reading until the line goes quiet or `buf` is full
///
/// The reader must already be configured with the idle timeout.
pub(crate) fn read_rest<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    mut filled: usize,
) -> Result<usize, ProtocolError> {
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(e.kind()) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
