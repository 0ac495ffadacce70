//! Camera Capture Library for Robot Camera Boards
//!
//! Continuously pulls JPEG frames from an SRV-style camera board over a
//! request/response transport and hands decoded frames to listeners.
//! Supports:
//! - Start/stop lifecycle with cooperative cancellation
//! - Frame-rate pacing with bounded stop latency
//! - Read-and-reset frame and byte counters
//! - Frame, error and playback-finished notifications

pub mod codec;
pub mod config;
pub mod events;
pub mod frame;
pub mod grabber;
mod pacing;
pub mod stats;
mod worker;

pub use codec::{FrameDecoder, JpegDecoder};
pub use config::{CaptureConfig, DecodeFailurePolicy};
pub use events::{CaptureEvent, FinishReason, ListenerId};
pub use frame::DecodedFrame;
pub use grabber::{FrameGrabber, SessionState};
pub use stats::CaptureStats;

use camera_protocol::ProtocolError;
use thiserror::Error;

/// Capture error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera transport is not connected")]
    NotConnected,

    #[error("Quality level {0} out of range (expected 1..=8)")]
    QualityOutOfRange(i32),

    #[error("Transport failure: {0}")]
    Transport(ProtocolError),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),

    #[error("Failed to spawn capture worker: {0}")]
    Spawn(String),
}

impl From<ProtocolError> for CaptureError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::NotConnected => CaptureError::NotConnected,
            ProtocolError::QualityOutOfRange(level) => CaptureError::QualityOutOfRange(level),
            ProtocolError::MalformedFrame(msg) => CaptureError::MalformedFrame(msg),
            other => CaptureError::Transport(other),
        }
    }
}
