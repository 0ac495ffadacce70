//! Capture worker loop

use crate::codec::FrameDecoder;
use crate::config::DecodeFailurePolicy;
use crate::events::{EventHub, FinishReason};
use crate::pacing;
use crate::stats::CaptureStats;
use crate::CaptureError;
use camera_protocol::{parse_response, Command, Response, SharedTransport, RESPONSE_BUFFER_CAPACITY};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// State shared between a grabber and its worker
pub(crate) struct Shared {
    pub(crate) stats: CaptureStats,
    pub(crate) events: EventHub,
    pub(crate) frame_interval_ms: AtomicU64,
    pub(crate) decode_failures: DecodeFailurePolicy,
}

/// One capture session's polling loop
pub(crate) struct Worker {
    pub(crate) transport: SharedTransport,
    pub(crate) decoder: Arc<dyn FrameDecoder>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) stop: Arc<AtomicBool>,
}

impl Worker {
    /// Poll until the stop flag is raised, then announce the end of playback
    pub(crate) fn run(self) {
        info!("Capture worker started");

        let request = Command::RequestFrame.encode();
        let mut buffer = vec![0u8; RESPONSE_BUFFER_CAPACITY];
        let mut sequence = 0u64;

        while !self.stop.load(Ordering::Acquire) {
            let started = Instant::now();

            if let Err(e) = self.poll_once(&request, &mut buffer, &mut sequence) {
                warn!("Frame acquisition failed: {}", e);
                self.shared.events.emit_error(&e);
            }

            let interval = self.shared.frame_interval_ms.load(Ordering::Relaxed);
            pacing::pace(interval, started.elapsed(), &self.stop);
        }

        info!("Capture worker stopped after {} frames", sequence);
        self.shared.events.emit_finished(FinishReason::StoppedByCaller);
    }

    /// Request, parse, decode and deliver one frame
    fn poll_once(
        &self,
        request: &[u8],
        buffer: &mut [u8],
        sequence: &mut u64,
    ) -> Result<(), CaptureError> {
        let received = {
            let mut transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
            transport.send_and_receive(request, buffer)?
        };
        let received = received.min(buffer.len());
        self.shared.stats.record_bytes(received as u64);

        let payload = match parse_response(&buffer[..received])? {
            Response::Image(payload) => payload,
            Response::Unrecognized => {
                debug!("Discarding {}-byte response without image signature", received);
                return Ok(());
            }
        };

        if self.stop.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut frame = match self.decoder.decode(payload) {
            Ok(frame) => frame,
            Err(e) => match self.shared.decode_failures {
                DecodeFailurePolicy::Drop => {
                    debug!("Dropping undecodable {}-byte payload: {}", payload.len(), e);
                    return Ok(());
                }
                DecodeFailurePolicy::Report => return Err(e),
            },
        };

        frame.sequence = *sequence;
        frame.timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        *sequence += 1;

        self.shared.stats.record_frame();
        self.shared.events.emit_frame(&frame);
        Ok(())
    }
}
