//! Grabber settings
//!
//! Loaded from an optional TOML file, overridden by `GRABBER__*` environment
//! variables (e.g. `GRABBER__CAPTURE__FRAME_INTERVAL_MS=200`).

use crate::GrabberError;
use camera_capture::CaptureConfig;
use camera_protocol::{Quality, Resolution, TransportConfig, DEFAULT_BAUD_RATE};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the camera board is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `tcp://host:port`
    Tcp(String),
    /// `serial:///dev/ttyUSB0@115200`
    Serial { device: String, baud_rate: u32 },
    /// `mock://`, a simulated board
    Mock,
}

impl Endpoint {
    /// Parse an endpoint URI
    pub fn parse(uri: &str) -> Result<Self, GrabberError> {
        let invalid = || GrabberError::InvalidEndpoint(uri.to_string());

        if let Some(addr) = uri.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(invalid());
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }

        if let Some(rest) = uri.strip_prefix("serial://") {
            let (device, baud_rate) = match rest.rsplit_once('@') {
                Some((device, baud)) => (device, baud.parse().map_err(|_| invalid())?),
                None => (rest, DEFAULT_BAUD_RATE),
            };
            if device.is_empty() {
                return Err(invalid());
            }
            return Ok(Endpoint::Serial {
                device: device.to_string(),
                baud_rate,
            });
        }

        if uri == "mock://" {
            return Ok(Endpoint::Mock);
        }

        Err(invalid())
    }
}

/// Transport timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        let defaults = TransportConfig::default();
        Self {
            connect_timeout_ms: defaults.connect_timeout.as_millis() as u64,
            read_timeout_ms: defaults.read_timeout.as_millis() as u64,
            idle_timeout_ms: defaults.idle_timeout.as_millis() as u64,
            write_timeout_ms: defaults.write_timeout.as_millis() as u64,
        }
    }
}

impl TransportSettings {
    /// Socket and serial timeouts of zero are rejected by the OS
    fn validate(&self) -> Result<(), GrabberError> {
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ] {
            if value == 0 {
                return Err(GrabberError::InvalidSettings(format!(
                    "transport.{} must be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl From<&TransportSettings> for TransportConfig {
    fn from(s: &TransportSettings) -> Self {
        TransportConfig {
            connect_timeout: Duration::from_millis(s.connect_timeout_ms),
            read_timeout: Duration::from_millis(s.read_timeout_ms),
            idle_timeout: Duration::from_millis(s.idle_timeout_ms),
            write_timeout: Duration::from_millis(s.write_timeout_ms),
        }
    }
}

/// Frame grabber settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera board endpoint URI
    pub endpoint: String,
    /// JPEG quality sent before streaming (1-8)
    pub quality: i32,
    /// Resolution sent before streaming
    pub resolution: Resolution,
    /// Capture engine settings
    pub capture: CaptureConfig,
    /// Transport timeouts
    pub transport: TransportSettings,
    /// Max log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Period of the throughput log line (milliseconds)
    pub stats_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "tcp://192.168.1.10:10001".to_string(),
            quality: Quality::default().level() as i32,
            resolution: Resolution::default(),
            capture: CaptureConfig::default(),
            transport: TransportSettings::default(),
            log_level: "info".to_string(),
            log_json: false,
            stats_interval_ms: 1000,
        }
    }
}

impl Settings {
    /// Load settings from `path` (optional) and the environment
    pub fn load(path: &str) -> Result<Self, GrabberError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("GRABBER").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that cannot work before anything is opened
    pub fn validate(&self) -> Result<(), GrabberError> {
        Quality::new(self.quality).map_err(|e| GrabberError::InvalidSettings(e.to_string()))?;
        Endpoint::parse(&self.endpoint)?;
        self.transport.validate()?;
        if self.stats_interval_ms == 0 {
            return Err(GrabberError::InvalidSettings(
                "stats_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed endpoint
    pub fn endpoint(&self) -> Result<Endpoint, GrabberError> {
        Endpoint::parse(&self.endpoint)
    }
}
