//! Decoded frame type

/// Decoded RGB video frame
///
/// Listeners receive frames by reference and must copy whatever they keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Index of this frame within the capture session
    pub sequence: u64,
    /// Wall-clock receive time (milliseconds since the Unix epoch)
    pub timestamp_ms: u64,
}

impl DecodedFrame {
    /// Create a new frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            sequence: 0,
            timestamp_ms: 0,
        }
    }
}
