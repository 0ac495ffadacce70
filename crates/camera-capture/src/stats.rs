//! Read-and-reset capture counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Frame and byte counters shared between the worker and readers
///
/// Each `take_*` call returns what accumulated since the previous call and
/// zeroes the counter in a single atomic swap, so no increment is lost.
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames: AtomicU64,
    bytes: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Frames delivered since the previous call
    pub fn take_frames(&self) -> u64 {
        self.frames.swap(0, Ordering::AcqRel)
    }

    /// Bytes received since the previous call
    pub fn take_bytes(&self) -> u64 {
        self.bytes.swap(0, Ordering::AcqRel)
    }

    pub fn reset(&self) {
        self.frames.store(0, Ordering::Release);
        self.bytes.store(0, Ordering::Release);
    }
}
