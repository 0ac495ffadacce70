//! Frame grabber lifecycle
//!
//! A [`FrameGrabber`] owns at most one capture worker at a time:
//!
//! ```text
//!   Idle --start--> Running --signal_to_stop / stop (timed out)--> StopRequested
//!    ^                 |                                               |
//!    +----stop---------+                                               |
//!    +----start (join) / wait_for_stop / is_running (reap)-------------+
//! ```

use crate::codec::FrameDecoder;
use crate::config::CaptureConfig;
use crate::events::{CaptureEvent, EventHub, FinishReason, ListenerId};
use crate::frame::DecodedFrame;
use crate::stats::CaptureStats;
use crate::worker::{Shared, Worker};
use crate::CaptureError;
use camera_protocol::{Command, Quality, Resolution, SharedTransport};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Poll period while `stop` waits for the worker
const STOP_POLL: Duration = Duration::from_millis(10);

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No worker
    Idle,
    /// Worker polling
    Running,
    /// Stop signalled, worker still winding down
    StopRequested,
}

struct WorkerHandle {
    thread: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl WorkerHandle {
    fn join(self) {
        if self.thread.thread().id() == thread::current().id() {
            warn!("Capture worker cannot wait for itself; detaching");
            return;
        }
        if self.thread.join().is_err() {
            error!("Capture worker panicked");
        }
    }
}

enum Lifecycle {
    Idle,
    Running(WorkerHandle),
    StopRequested(WorkerHandle),
}

impl Lifecycle {
    fn state(&self) -> SessionState {
        match self {
            Lifecycle::Idle => SessionState::Idle,
            Lifecycle::Running(_) => SessionState::Running,
            Lifecycle::StopRequested(_) => SessionState::StopRequested,
        }
    }

    /// Release a worker that has already exited
    fn reap(&mut self) {
        let finished = match self {
            Lifecycle::Running(w) | Lifecycle::StopRequested(w) => w.thread.is_finished(),
            Lifecycle::Idle => false,
        };
        if finished {
            if let Some(worker) = self.take() {
                worker.join();
                info!("Capture worker exited; session idle");
            }
        }
    }

    /// Move the worker out, leaving the session idle
    fn take(&mut self) -> Option<WorkerHandle> {
        match std::mem::replace(self, Lifecycle::Idle) {
            Lifecycle::Running(w) | Lifecycle::StopRequested(w) => Some(w),
            Lifecycle::Idle => None,
        }
    }
}

/// Continuous frame acquisition from one camera board
///
/// Control methods may be called from any thread while the worker runs.
/// Dropping the grabber stops the worker.
pub struct FrameGrabber {
    transport: SharedTransport,
    decoder: Arc<dyn FrameDecoder>,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
    stop_timeout: Duration,
    quality: Mutex<Option<Quality>>,
    resolution: Mutex<Option<Resolution>>,
}

impl FrameGrabber {
    /// Create an idle grabber on an established transport
    pub fn new<D>(transport: SharedTransport, decoder: D, config: CaptureConfig) -> Self
    where
        D: FrameDecoder + 'static,
    {
        debug!("Creating frame grabber with config: {:?}", config);
        Self {
            transport,
            decoder: Arc::new(decoder),
            shared: Arc::new(Shared {
                stats: CaptureStats::new(),
                events: EventHub::new(),
                frame_interval_ms: AtomicU64::new(config.frame_interval_ms),
                decode_failures: config.decode_failures,
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
            stop_timeout: Duration::from_millis(config.stop_timeout_ms),
            quality: Mutex::new(None),
            resolution: Mutex::new(None),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self) -> Option<String> {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .endpoint()
    }

    /// Start a capture session
    ///
    /// No-op while running. Statistics restart from zero.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut lifecycle = self.lifecycle();
        lifecycle.reap();

        match std::mem::replace(&mut *lifecycle, Lifecycle::Idle) {
            Lifecycle::Running(worker) => {
                debug!("Capture already running");
                *lifecycle = Lifecycle::Running(worker);
                return Ok(());
            }
            Lifecycle::StopRequested(worker) => {
                info!("Waiting for previous capture worker to wind down");
                worker.join();
            }
            Lifecycle::Idle => {}
        }

        let source = self.endpoint().ok_or(CaptureError::NotConnected)?;

        self.shared.stats.reset();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            transport: self.transport.clone(),
            decoder: self.decoder.clone(),
            shared: self.shared.clone(),
            stop: stop.clone(),
        };

        let thread = thread::Builder::new()
            .name("frame-grabber".to_string())
            .spawn(move || worker.run())
            .map_err(|e| CaptureError::Spawn(e.to_string()))?;

        *lifecycle = Lifecycle::Running(WorkerHandle { thread, stop });
        info!("Frame capture started from {}", source);
        Ok(())
    }

    /// Ask the worker to stop without waiting for it
    pub fn signal_to_stop(&self) {
        let mut lifecycle = self.lifecycle();
        if matches!(*lifecycle, Lifecycle::Running(_)) {
            if let Some(worker) = lifecycle.take() {
                worker.stop.store(true, Ordering::Release);
                *lifecycle = Lifecycle::StopRequested(worker);
                info!("Frame capture stop requested");
            }
        }
    }

    /// Block until the worker has exited, then return to idle
    ///
    /// Only returns once the worker observes a stop signal, so call
    /// [`signal_to_stop`](Self::signal_to_stop) first.
    pub fn wait_for_stop(&self) {
        let mut lifecycle = self.lifecycle();
        if let Some(worker) = lifecycle.take() {
            worker.join();
            info!("Frame capture stopped");
        }
    }

    /// Signal the worker and wait up to the configured stop timeout
    ///
    /// A worker still blocked in the transport after the timeout stays in
    /// [`SessionState::StopRequested`]. The next [`start`](Self::start) joins
    /// it before spawning a replacement, so its final notifications and byte
    /// counts never reach the new session.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle();
        let Some(worker) = lifecycle.take() else {
            return;
        };

        worker.stop.store(true, Ordering::Release);
        let deadline = Instant::now() + self.stop_timeout;
        while !worker.thread.is_finished() && Instant::now() < deadline {
            thread::sleep(STOP_POLL);
        }

        if worker.thread.is_finished() {
            worker.join();
            info!("Frame capture stopped");
        } else {
            warn!(
                "Capture worker did not exit within {:?}; leaving it to wind down",
                self.stop_timeout
            );
            *lifecycle = Lifecycle::StopRequested(worker);
        }
    }

    /// Whether a worker is alive
    ///
    /// Releases a worker that has exited on its own, after which the session
    /// reports idle.
    pub fn is_running(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Current lifecycle state, reaping an exited worker first
    pub fn state(&self) -> SessionState {
        let mut lifecycle = self.lifecycle();
        lifecycle.reap();
        lifecycle.state()
    }

    /// Set JPEG quality (1 = highest, 8 = lowest)
    pub fn set_quality(&self, level: i32) -> Result<(), CaptureError> {
        let quality = Quality::new(level)?;
        self.send(Command::SetQuality(quality))?;
        *self.quality.lock().unwrap_or_else(PoisonError::into_inner) = Some(quality);
        Ok(())
    }

    /// Set capture resolution
    pub fn set_resolution(&self, resolution: Resolution) -> Result<(), CaptureError> {
        self.send(Command::SetResolution(resolution))?;
        *self.resolution.lock().unwrap_or_else(PoisonError::into_inner) = Some(resolution);
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), CaptureError> {
        debug!("Sending {:?}", command);
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(&command.encode())?;
        Ok(())
    }

    /// Last quality successfully sent
    pub fn quality(&self) -> Option<Quality> {
        *self.quality.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last resolution successfully sent
    pub fn resolution(&self) -> Option<Resolution> {
        *self.resolution.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Minimum time between frame requests in milliseconds (0 = unpaced)
    pub fn frame_interval(&self) -> u64 {
        self.shared.frame_interval_ms.load(Ordering::Relaxed)
    }

    /// Change the frame interval; takes effect on the next iteration
    pub fn set_frame_interval(&self, interval_ms: u64) {
        self.shared.frame_interval_ms.store(interval_ms, Ordering::Relaxed);
    }

    /// Connected endpoint, or "unknown"
    pub fn source(&self) -> String {
        self.endpoint().unwrap_or_else(|| "unknown".to_string())
    }

    /// Frames delivered since the previous call
    pub fn frames_received(&self) -> u64 {
        self.shared.stats.take_frames()
    }

    /// Bytes received since the previous call
    pub fn bytes_received(&self) -> u64 {
        self.shared.stats.take_bytes()
    }

    /// Register a frame listener
    pub fn on_frame<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&DecodedFrame) + Send + 'static,
    {
        self.shared.events.on_frame(listener)
    }

    /// Register an error listener
    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&CaptureError) + Send + 'static,
    {
        self.shared.events.on_error(listener)
    }

    /// Register a playback-finished listener
    pub fn on_finished<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&FinishReason) + Send + 'static,
    {
        self.shared.events.on_finished(listener)
    }

    /// Receive all notifications through a bounded channel
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<CaptureEvent> {
        self.shared.events.subscribe(capacity)
    }

    /// Unregister a listener; returns whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.events.remove(id)
    }
}

impl Drop for FrameGrabber {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeFailurePolicy;
    use camera_protocol::{MockTransport, ProtocolError};
    use std::sync::mpsc as std_mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    fn passthrough(payload: &[u8]) -> Result<DecodedFrame, CaptureError> {
        Ok(DecodedFrame::new(payload.to_vec(), payload.len() as u32, 1))
    }

    fn grabber_with(mock: MockTransport, config: CaptureConfig) -> (FrameGrabber, Arc<Mutex<MockTransport>>) {
        let mock = Arc::new(Mutex::new(mock));
        let transport: SharedTransport = mock.clone();
        (FrameGrabber::new(transport, passthrough, config), mock)
    }

    /// Quiet loop once the script runs out: every exchange times out
    fn paced() -> CaptureConfig {
        CaptureConfig {
            frame_interval_ms: 10,
            ..Default::default()
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + WAIT;
        while !cond() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_start_requires_connection() {
        let mut mock = MockTransport::streaming(b"jpeg");
        mock.set_connected(false);
        let (grabber, _) = grabber_with(mock, CaptureConfig::default());

        assert_eq!(grabber.start(), Err(CaptureError::NotConnected));
        assert_eq!(grabber.state(), SessionState::Idle);
        assert_eq!(grabber.source(), "unknown");
    }

    #[test]
    fn test_delivers_decoded_frame() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let response = MockTransport::image_frame(&payload);
        let mut mock = MockTransport::new();
        mock.push_response(response.clone());
        let (grabber, _) = grabber_with(mock, paced());

        let (tx, rx) = std_mpsc::channel();
        grabber.on_frame(move |frame| tx.send(frame.clone()).unwrap());
        grabber.start().unwrap();

        let frame = rx.recv_timeout(WAIT).unwrap();
        grabber.signal_to_stop();
        grabber.wait_for_stop();

        assert_eq!(frame.data, payload);
        assert_eq!(frame.sequence, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(grabber.frames_received(), 1);
        assert_eq!(grabber.bytes_received(), response.len() as u64);
        assert_eq!(grabber.frames_received(), 0);
        assert_eq!(grabber.bytes_received(), 0);
    }

    #[test]
    fn test_unsigned_response_counts_bytes_only() {
        let mut response = MockTransport::image_frame(&[9; 40]);
        response[..5].copy_from_slice(b"##JPG");
        let mut mock = MockTransport::new();
        mock.push_response(response.clone());
        let (grabber, _) = grabber_with(mock, paced());

        let frames = Arc::new(AtomicU64::new(0));
        let counter = frames.clone();
        grabber.on_frame(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let (tx, rx) = std_mpsc::channel();
        grabber.on_error(move |err| {
            let _ = tx.send(err.clone());
        });

        grabber.start().unwrap();
        // The exhausted script times out after the unsigned response
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            CaptureError::Transport(ProtocolError::Timeout(0))
        );
        grabber.stop();

        assert_eq!(frames.load(Ordering::Relaxed), 0);
        assert_eq!(grabber.frames_received(), 0);
        assert_eq!(grabber.bytes_received(), response.len() as u64);
    }

    #[test]
    fn test_oversized_length_reported() {
        let mut response = MockTransport::image_frame(&[1; 20]);
        response[6..10].copy_from_slice(&5000u32.to_le_bytes());
        let mut mock = MockTransport::new();
        mock.push_response(response.clone());
        let (grabber, _) = grabber_with(mock, paced());

        let (tx, rx) = std_mpsc::channel();
        grabber.on_error(move |err| {
            let _ = tx.send(err.clone());
        });
        grabber.start().unwrap();

        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            CaptureError::MalformedFrame(_)
        ));
        grabber.stop();
        assert_eq!(grabber.bytes_received(), response.len() as u64);
    }

    #[test]
    fn test_transport_errors_do_not_end_loop() {
        let mut mock = MockTransport::streaming(b"after");
        mock.push_error(ProtocolError::Io("connection reset".into()));
        mock.push_error(ProtocolError::Io("connection reset".into()));
        let (grabber, _) = grabber_with(mock, CaptureConfig::default());

        let errors = Arc::new(AtomicU64::new(0));
        let counter = errors.clone();
        grabber.on_error(move |err| {
            assert!(matches!(err, CaptureError::Transport(ProtocolError::Io(_))));
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let (tx, rx) = std_mpsc::channel();
        grabber.on_frame(move |frame| {
            let _ = tx.send(frame.data.clone());
        });

        grabber.start().unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), b"after");
        grabber.stop();

        assert_eq!(errors.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_decode_failure_policy() {
        fn reject(_: &[u8]) -> Result<DecodedFrame, CaptureError> {
            Err(CaptureError::Decode("truncated JPEG".into()))
        }

        for (policy, expect_error) in [
            (DecodeFailurePolicy::Drop, false),
            (DecodeFailurePolicy::Report, true),
        ] {
            let mock = Arc::new(Mutex::new(MockTransport::streaming(b"junk")));
            let transport: SharedTransport = mock.clone();
            let config = CaptureConfig {
                frame_interval_ms: 5,
                decode_failures: policy,
                ..Default::default()
            };
            let grabber = FrameGrabber::new(transport, reject, config);

            let errors = Arc::new(AtomicU64::new(0));
            let counter = errors.clone();
            grabber.on_error(move |err| {
                assert!(matches!(err, CaptureError::Decode(_)));
                counter.fetch_add(1, Ordering::Relaxed);
            });

            grabber.start().unwrap();
            wait_until(|| mock.lock().unwrap().sent().len() >= 3);
            grabber.stop();

            assert_eq!(errors.load(Ordering::Relaxed) > 0, expect_error);
            assert_eq!(grabber.frames_received(), 0);
            assert!(grabber.bytes_received() > 0);
        }
    }

    #[test]
    fn test_second_start_is_noop() {
        let response = MockTransport::image_frame(b"only");
        let mut mock = MockTransport::new();
        mock.push_response(response.clone());
        let (grabber, mock) = grabber_with(mock, paced());

        let (tx, rx) = std_mpsc::channel();
        grabber.on_frame(move |_| {
            let _ = tx.send(());
        });
        grabber.start().unwrap();
        rx.recv_timeout(WAIT).unwrap();

        grabber.start().unwrap();
        assert_eq!(grabber.state(), SessionState::Running);
        assert_eq!(mock.lock().unwrap().remaining(), 0);
        grabber.stop();

        // Counters from the first start survive the second call
        assert_eq!(grabber.frames_received(), 1);
        assert_eq!(grabber.bytes_received(), response.len() as u64);
    }

    #[test]
    fn test_stop_signal_ends_with_one_finished() {
        let mut mock = MockTransport::streaming(b"frame");
        mock.set_latency(Duration::from_millis(2));
        let (grabber, _) = grabber_with(mock, CaptureConfig::default());

        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        grabber.on_frame(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (tx, rx) = std_mpsc::channel();
        grabber.on_finished(move |reason| tx.send(*reason).unwrap());

        grabber.start().unwrap();
        wait_until(|| delivered.load(Ordering::SeqCst) >= 3);

        grabber.signal_to_stop();
        let at_signal = delivered.load(Ordering::SeqCst);
        assert_ne!(grabber.state(), SessionState::Running);
        grabber.wait_for_stop();

        let at_exit = delivered.load(Ordering::SeqCst);
        assert!(at_exit <= at_signal + 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), FinishReason::StoppedByCaller);
        assert!(rx.try_recv().is_err());

        thread::sleep(Duration::from_millis(30));
        assert_eq!(delivered.load(Ordering::SeqCst), at_exit);
        assert_eq!(grabber.state(), SessionState::Idle);
    }

    #[test]
    fn test_is_running_reaps_exited_worker() {
        let (grabber, _) = grabber_with(MockTransport::streaming(b"x"), paced());

        grabber.start().unwrap();
        assert!(grabber.is_running());

        grabber.signal_to_stop();
        wait_until(|| !grabber.is_running());

        assert_eq!(grabber.state(), SessionState::Idle);
        assert!(!grabber.is_running());
        // Nothing left to join
        grabber.wait_for_stop();
        grabber.signal_to_stop();
        assert!(!grabber.is_running());
    }

    #[test]
    fn test_restart_after_stop() {
        let (grabber, _) = grabber_with(MockTransport::streaming(b"x"), paced());

        let (tx, rx) = std_mpsc::channel();
        grabber.on_frame(move |frame| {
            let _ = tx.send(frame.sequence);
        });

        grabber.start().unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 0);
        grabber.signal_to_stop();
        grabber.start().unwrap();
        assert_eq!(grabber.state(), SessionState::Running);

        // Sequence numbers restart with the new session
        let mut restarted = false;
        while let Ok(seq) = rx.recv_timeout(WAIT) {
            if seq == 0 {
                restarted = true;
                break;
            }
        }
        assert!(restarted);
        grabber.stop();
    }

    #[test]
    fn test_stop_times_out_on_stuck_worker() {
        let mut mock = MockTransport::streaming(b"slow");
        mock.set_latency(Duration::from_millis(500));
        let config = CaptureConfig {
            stop_timeout_ms: 50,
            ..Default::default()
        };
        let (grabber, mock) = grabber_with(mock, config);

        grabber.start().unwrap();
        wait_until(|| mock.try_lock().map(|m| !m.sent().is_empty()).unwrap_or(true));

        let started = Instant::now();
        grabber.stop();
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(grabber.state(), SessionState::StopRequested);

        grabber.wait_for_stop();
        assert_eq!(grabber.state(), SessionState::Idle);
    }

    #[test]
    fn test_restart_after_timed_out_stop() {
        let mut mock = MockTransport::streaming(b"slow");
        mock.set_latency(Duration::from_millis(400));
        let config = CaptureConfig {
            stop_timeout_ms: 50,
            ..Default::default()
        };
        let (grabber, mock) = grabber_with(mock, config);

        let (tx, rx) = std_mpsc::channel();
        grabber.on_frame(move |frame| {
            let _ = tx.send(frame.sequence);
        });

        grabber.start().unwrap();
        wait_until(|| mock.try_lock().map(|m| !m.sent().is_empty()).unwrap_or(true));
        grabber.stop();
        assert_eq!(grabber.state(), SessionState::StopRequested);

        let finished = Arc::new(AtomicU64::new(0));
        let counter = finished.clone();
        grabber.on_finished(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The old worker winds down inside start, before the new session begins
        grabber.start().unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(grabber.bytes_received(), 0);
        assert!(rx.try_recv().is_err());

        thread::sleep(Duration::from_millis(600));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(grabber.state(), SessionState::Running);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 0);

        grabber.signal_to_stop();
        grabber.wait_for_stop();
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_one_shot_listener_removes_itself() {
        let (grabber, _) = grabber_with(MockTransport::streaming(b"once"), paced());
        let grabber = Arc::new(grabber);

        let own_id = Arc::new(Mutex::new(None));
        let (tx, rx) = std_mpsc::channel();
        let id = {
            let weak = Arc::downgrade(&grabber);
            let own_id = own_id.clone();
            grabber.on_frame(move |frame| {
                if let (Some(grabber), Some(id)) = (weak.upgrade(), *own_id.lock().unwrap()) {
                    grabber.remove_listener(id);
                }
                let _ = tx.send(frame.sequence);
            })
        };
        *own_id.lock().unwrap() = Some(id);

        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        grabber.on_frame(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        grabber.start().unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 0);
        wait_until(|| delivered.load(Ordering::SeqCst) >= 3);
        grabber.stop();

        assert!(rx.try_recv().is_err());
        assert!(!grabber.remove_listener(id));
        assert_eq!(grabber.state(), SessionState::Idle);
    }

    #[test]
    fn test_set_quality() {
        let (grabber, mock) = grabber_with(MockTransport::new(), CaptureConfig::default());

        for level in [0, 9, -1] {
            assert_eq!(
                grabber.set_quality(level),
                Err(CaptureError::QualityOutOfRange(level))
            );
        }
        assert!(mock.lock().unwrap().sent().is_empty());
        assert_eq!(grabber.quality(), None);

        grabber.set_quality(1).unwrap();
        grabber.set_quality(8).unwrap();
        assert_eq!(mock.lock().unwrap().sent(), &[b"q1".to_vec(), b"q8".to_vec()]);
        assert_eq!(grabber.quality(), Some(Quality::LOWEST));
    }

    #[test]
    fn test_set_resolution() {
        let (grabber, mock) = grabber_with(MockTransport::new(), CaptureConfig::default());

        grabber.set_resolution(Resolution::Vga).unwrap();
        assert_eq!(mock.lock().unwrap().sent(), &[b"c".to_vec()]);
        assert_eq!(grabber.resolution(), Some(Resolution::Vga));

        mock.lock().unwrap().set_connected(false);
        assert_eq!(
            grabber.set_resolution(Resolution::Sxga),
            Err(CaptureError::NotConnected)
        );
        assert_eq!(grabber.resolution(), Some(Resolution::Vga));
    }

    #[test]
    fn test_configuration_accessors() {
        let (grabber, _) = grabber_with(MockTransport::new(), CaptureConfig::with_fps(10));

        assert_eq!(grabber.frame_interval(), 100);
        grabber.set_frame_interval(0);
        assert_eq!(grabber.frame_interval(), 0);
        assert_eq!(grabber.source(), "mock");
    }

    #[tokio::test]
    async fn test_channel_subscription() {
        let (grabber, _) = grabber_with(MockTransport::streaming(b"chan"), paced());
        let mut rx = grabber.subscribe(8);

        grabber.start().unwrap();
        match rx.recv().await {
            Some(CaptureEvent::Frame(frame)) => assert_eq!(frame.data, b"chan"),
            other => panic!("unexpected event: {:?}", other),
        }

        grabber.signal_to_stop();
        loop {
            match rx.recv().await {
                Some(CaptureEvent::Finished(reason)) => {
                    assert_eq!(reason, FinishReason::StoppedByCaller);
                    break;
                }
                Some(_) => continue,
                None => panic!("channel closed before finish"),
            }
        }
        grabber.wait_for_stop();
        assert!(!grabber.is_running());
    }
}
