//! Image Response Framing
//!
//! An image response is laid out as:
//!
//! | Offset | Field | Encoding |
//! |---|---|---|
//! | 0..5 | signature | ASCII `##IMJ` |
//! | 5 | reserved | unused, not inspected |
//! | 6..10 | payload length | little-endian u32 |
//! | 10.. | payload | JPEG bytes |

use crate::error::ProtocolError;

/// Signature that opens every image response
pub const SIGNATURE: &[u8; 5] = b"##IMJ";

/// Offset of the little-endian payload length
pub const LENGTH_OFFSET: usize = 6;

/// Size of the image response header
pub const HEADER_LEN: usize = 10;

/// Capacity of the buffer a response is received into (768 KiB)
pub const RESPONSE_BUFFER_CAPACITY: usize = 768 * 1024;

/// A parsed camera response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// Compressed image payload, borrowed from the response buffer
    Image(&'a [u8]),
    /// Too short or not carrying the image signature
    Unrecognized,
}

/// Extract the image payload from a received response
///
/// Returns `Unrecognized` for responses that are not image frames. A frame
/// whose declared length runs past the received bytes is an error.
pub fn parse_response(data: &[u8]) -> Result<Response<'_>, ProtocolError> {
    if data.len() <= HEADER_LEN || !data.starts_with(SIGNATURE) {
        return Ok(Response::Unrecognized);
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[LENGTH_OFFSET..HEADER_LEN]);
    let declared = u32::from_le_bytes(len_bytes) as usize;

    let end = HEADER_LEN
        .checked_add(declared)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            ProtocolError::MalformedFrame(format!(
                "declared payload of {} bytes exceeds {} received",
                declared,
                data.len() - HEADER_LEN
            ))
        })?;

    Ok(Response::Image(&data[HEADER_LEN..end]))
}
