//! Capture configuration

use serde::{Deserialize, Serialize};

/// What the worker does with a payload the decoder rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFailurePolicy {
    /// Discard the frame without notifying anyone
    #[default]
    Drop,
    /// Report the failure on the error channel
    Report,
}

/// Capture engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Minimum time between frame requests (milliseconds, 0 = unpaced)
    pub frame_interval_ms: u64,

    /// Handling of undecodable payloads
    pub decode_failures: DecodeFailurePolicy,

    /// How long `stop` waits for the worker before leaving it to wind down (milliseconds)
    pub stop_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 0,
            decode_failures: DecodeFailurePolicy::Drop,
            stop_timeout_ms: 2000,
        }
    }
}

impl CaptureConfig {
    /// Create a config capped at `fps` frames per second
    pub fn with_fps(fps: u32) -> Self {
        Self {
            frame_interval_ms: if fps == 0 { 0 } else { 1000 / fps as u64 },
            ..Default::default()
        }
    }
}
