//! Robot Camera Frame Grabber
//!
//! Connects to a camera board, streams frames through the capture engine and
//! logs throughput until interrupted.

use camera_capture::{CaptureError, CaptureEvent, FrameGrabber, JpegDecoder};
use camera_protocol::{
    MockTransport, ProtocolError, SerialTransport, SharedTransport, TcpTransport, TransportConfig,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod settings;

pub use settings::{Endpoint, Settings, TransportSettings};

/// Settings file read when no path is given
pub const DEFAULT_SETTINGS_PATH: &str = "grabber.toml";

/// Capacity of the event channel between the worker and the logger
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Grabber error types
#[derive(Error, Debug)]
pub enum GrabberError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Initialize logging
pub fn init_logging(settings: &Settings) -> Result<(), GrabberError> {
    let level = settings.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| GrabberError::Logging(e.to_string()))
}

/// Open the transport named by the settings
pub fn open_transport(settings: &Settings) -> Result<SharedTransport, GrabberError> {
    let config = TransportConfig::from(&settings.transport);

    let transport: SharedTransport = match settings.endpoint()? {
        Endpoint::Tcp(addr) => Arc::new(Mutex::new(TcpTransport::connect(&addr, config)?)),
        Endpoint::Serial { device, baud_rate } => {
            Arc::new(Mutex::new(SerialTransport::open(&device, baud_rate, config)?))
        }
        Endpoint::Mock => {
            info!("Using simulated camera board");
            let mut mock = MockTransport::streaming(&test_card(settings.resolution.dimensions())?);
            mock.set_latency(Duration::from_millis(5));
            Arc::new(Mutex::new(mock))
        }
    };

    Ok(transport)
}

/// JPEG served by the simulated board
fn test_card((width, height): (u32, u32)) -> Result<Vec<u8>, GrabberError> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut jpeg = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .map_err(|e| GrabberError::InvalidSettings(format!("test card: {}", e)))?;
    Ok(jpeg.into_inner())
}

/// Run until Ctrl-C
pub async fn run(settings: Settings) -> Result<(), GrabberError> {
    run_until(settings, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received");
    })
    .await
}

/// Run until `shutdown` completes or playback finishes
pub async fn run_until<S>(settings: Settings, shutdown: S) -> Result<(), GrabberError>
where
    S: Future<Output = ()>,
{
    settings.validate()?;

    let transport = {
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || open_transport(&settings))
            .await
            .map_err(|e| GrabberError::Task(e.to_string()))??
    };

    let grabber = Arc::new(FrameGrabber::new(
        transport,
        JpegDecoder,
        settings.capture.clone(),
    ));
    grabber.set_resolution(settings.resolution)?;
    grabber.set_quality(settings.quality)?;

    let mut events = grabber.subscribe(EVENT_CHANNEL_CAPACITY);
    grabber.start()?;
    info!("Streaming from {}", grabber.source());

    let period = Duration::from_millis(settings.stats_interval_ms);
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let frames = grabber.frames_received();
                let bytes = grabber.bytes_received();
                let secs = period.as_secs_f64();
                info!(
                    "{:.1} fps, {:.1} KiB/s from {}",
                    frames as f64 / secs,
                    bytes as f64 / 1024.0 / secs,
                    grabber.source()
                );
            }
            event = events.recv() => match event {
                Some(CaptureEvent::Frame(frame)) => {
                    debug!("Frame {} ({}x{})", frame.sequence, frame.width, frame.height);
                }
                Some(CaptureEvent::Error(e)) => warn!("Capture error: {}", e),
                Some(CaptureEvent::Finished(reason)) => {
                    info!("Playback finished: {:?}", reason);
                    break;
                }
                None => break,
            },
        }
    }

    grabber.signal_to_stop();
    // Unblocks a worker waiting on a full channel
    drop(events);

    let waiter = grabber.clone();
    tokio::task::spawn_blocking(move || waiter.wait_for_stop())
        .await
        .map_err(|e| GrabberError::Task(e.to_string()))?;

    info!("Frame grabber shut down");
    Ok(())
}
