//! Frame decoding

use crate::frame::DecodedFrame;
use crate::CaptureError;
use image::ImageFormat;

/// Turns a compressed payload into a decoded frame
///
/// Called on the capture worker thread.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DecodedFrame, CaptureError>;
}

/// Baseline JPEG decoder producing RGB8 frames
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DecodedFrame, CaptureError> {
        let img = image::load_from_memory_with_format(payload, ImageFormat::Jpeg)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(DecodedFrame::new(rgb.into_raw(), width, height))
    }
}

impl<F> FrameDecoder for F
where
    F: Fn(&[u8]) -> Result<DecodedFrame, CaptureError> + Send + Sync,
{
    fn decode(&self, payload: &[u8]) -> Result<DecodedFrame, CaptureError> {
        self(payload)
    }
}
