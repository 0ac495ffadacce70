//! Camera Protocol Error Types

use thiserror::Error;

/// Errors that can occur while talking to the camera board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Transport has no established endpoint
    #[error("Transport is not connected")]
    NotConnected,

    /// Socket or serial port error
    #[error("Transport I/O error: {0}")]
    Io(String),

    /// Timeout waiting for response
    #[error("Timeout waiting for camera response after {0}ms")]
    Timeout(u64),

    /// Response framing is inconsistent with the received data
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Quality level outside 1..=8
    #[error("Quality level {0} out of range (expected 1..=8)")]
    QualityOutOfRange(i32),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err.to_string())
    }
}
