//! Camera Command Encoding

use crate::opcode;
use crate::protocol::{Quality, Resolution};

/// Commands understood by the camera board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request one compressed frame (answered with an image response)
    RequestFrame,
    /// Change JPEG quality (no response)
    SetQuality(Quality),
    /// Change capture resolution (no response)
    SetResolution(Resolution),
}

impl Command {
    /// Encode the command into its wire bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::RequestFrame => vec![opcode::REQUEST_FRAME],
            Command::SetQuality(q) => vec![opcode::SET_QUALITY, opcode::QUALITY_BASE + q.level()],
            Command::SetResolution(r) => vec![r.code()],
        }
    }
}
