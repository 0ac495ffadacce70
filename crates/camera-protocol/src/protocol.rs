//! Camera Setting Definitions

use crate::error::ProtocolError;
use crate::opcode;
use serde::{Deserialize, Serialize};

/// JPEG compression quality level (1 = highest, 8 = lowest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Highest quality, largest frames
    pub const HIGHEST: Quality = Quality(1);
    /// Lowest quality, smallest frames
    pub const LOWEST: Quality = Quality(8);

    /// Validate a quality level
    pub fn new(level: i32) -> Result<Self, ProtocolError> {
        if (1..=8).contains(&level) {
            Ok(Quality(level as u8))
        } else {
            Err(ProtocolError::QualityOutOfRange(level))
        }
    }

    /// Get the numeric level
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        // Power-on default of the board
        Quality(3)
    }
}

impl TryFrom<i32> for Quality {
    type Error = ProtocolError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Quality::new(level)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// Supported capture resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// 160x120
    Qqvga,
    /// 320x240
    Qvga,
    /// 640x480
    Vga,
    /// 1280x1024
    Sxga,
}

impl Resolution {
    /// All resolutions, smallest first
    pub const ALL: [Resolution; 4] = [
        Resolution::Qqvga,
        Resolution::Qvga,
        Resolution::Vga,
        Resolution::Sxga,
    ];

    /// Get the command byte selecting this resolution
    pub fn code(&self) -> u8 {
        match self {
            Resolution::Qqvga => opcode::RESOLUTION_QQVGA,
            Resolution::Qvga => opcode::RESOLUTION_QVGA,
            Resolution::Vga => opcode::RESOLUTION_VGA,
            Resolution::Sxga => opcode::RESOLUTION_SXGA,
        }
    }

    /// Look up a resolution by its command byte
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Get (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Qqvga => (160, 120),
            Resolution::Qvga => (320, 240),
            Resolution::Vga => (640, 480),
            Resolution::Sxga => (1280, 1024),
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Qvga
    }
}
