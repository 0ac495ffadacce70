//! Robot Camera Board Protocol
//!
//! This crate provides the request/response wire protocol spoken by
//! SRV-style robot camera boards, plus blocking transports (TCP and serial)
//! that carry it.

mod command;
mod error;
mod frame;
pub mod mock;
mod protocol;
mod serial;
mod tcp;
mod transport;

pub use command::Command;
pub use error::ProtocolError;
pub use frame::{
    parse_response, Response, HEADER_LEN, LENGTH_OFFSET, RESPONSE_BUFFER_CAPACITY, SIGNATURE,
};
pub use mock::MockTransport;
pub use protocol::{Quality, Resolution};
pub use serial::{SerialTransport, DEFAULT_BAUD_RATE};
pub use tcp::TcpTransport;
pub use transport::{SharedTransport, Transport, TransportConfig};

/// Command opcode bytes
pub mod opcode {
    /// Grab one compressed frame
    pub const REQUEST_FRAME: u8 = b'I';
    /// Set compression quality, followed by one level byte
    pub const SET_QUALITY: u8 = b'q';
    /// Base added to a quality level to form its wire byte
    pub const QUALITY_BASE: u8 = b'0';
    /// 160x120
    pub const RESOLUTION_QQVGA: u8 = b'a';
    /// 320x240
    pub const RESOLUTION_QVGA: u8 = b'b';
    /// 640x480
    pub const RESOLUTION_VGA: u8 = b'c';
    /// 1280x1024
    pub const RESOLUTION_SXGA: u8 = b'A';
}
