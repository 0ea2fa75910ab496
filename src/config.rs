//! Configuration parsing and management for Pinchwire

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, PinchwireError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gesture: GestureConfig,
    pub tracking: TrackingConfig,
    pub channel: ChannelConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PinchwireError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, PinchwireError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, PinchwireError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration.
    ///
    /// Degenerate gesture timings are rejected here so they surface at
    /// startup instead of as odd runtime behavior.
    pub fn validate(&self) -> Result<(), PinchwireError> {
        let g = &self.gesture;
        positive("gesture.tap_threshold", g.tap_threshold)?;
        positive("gesture.double_tap_window_secs", g.double_tap_window_secs)?;
        positive("gesture.right_hold_timeout_secs", g.right_hold_timeout_secs)?;
        positive("gesture.left_hold_timeout_secs", g.left_hold_timeout_secs)?;

        let t = &self.tracking;
        nonzero("tracking.port", t.port as u64)?;
        nonzero("tracking.capture_width", t.capture_width as u64)?;
        nonzero("tracking.capture_height", t.capture_height as u64)?;
        unit_interval("tracking.min_detection_confidence", t.min_detection_confidence)?;
        unit_interval("tracking.min_tracking_confidence", t.min_tracking_confidence)?;

        if t.auto_launch {
            let path = Path::new(&t.tracker_script);
            if !path.exists() {
                tracing::warn!(
                    "Tracker auto_launch enabled but script not found at: {}",
                    t.tracker_script
                );
            }
        }

        let c = &self.channel;
        nonzero("channel.port", c.port as u64)?;
        nonzero("channel.queue_capacity", c.queue_capacity as u64)?;
        nonzero("channel.connect_timeout_ms", c.connect_timeout_ms)?;
        nonzero("channel.write_timeout_ms", c.write_timeout_ms)?;

        let r = &self.relay;
        nonzero("relay.listen_port", r.listen_port as u64)?;
        nonzero("relay.http_port", r.http_port as u64)?;

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> PinchwireError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn positive(field: &str, value: f64) -> Result<(), PinchwireError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite value greater than 0"))
    }
}

fn nonzero(field: &str, value: u64) -> Result<(), PinchwireError> {
    if value > 0 {
        Ok(())
    } else {
        Err(invalid(field, "must be greater than 0"))
    }
}

fn unit_interval(field: &str, value: f32) -> Result<(), PinchwireError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0.0 and 1.0"))
    }
}

/// Gesture classifier tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb-index distance (normalized) below which fingers count as touching
    pub tap_threshold: f64,
    /// Max gap between two pinch starts to count as a double-tap (seconds)
    pub double_tap_window_secs: f64,
    /// Sustained pinch that exits Right select mode (seconds)
    pub right_hold_timeout_secs: f64,
    /// Sustained pinch that enters Left move mode; also the drag release timeout (seconds)
    pub left_hold_timeout_secs: f64,
    /// Also force Right back to normal when a frame has no hands
    pub reset_right_on_empty_frame: bool,
    /// Ignore Left double-taps while a drag is in progress
    pub guard_double_tap_in_move: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_threshold: 0.05,
            double_tap_window_secs: 0.30,
            right_hold_timeout_secs: 1.0,
            left_hold_timeout_secs: 0.5,
            reset_right_on_empty_frame: false,
            guard_double_tap_in_move: false,
        }
    }
}

/// Hand landmark source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// UDP port to receive landmark frames on
    pub port: u16,
    /// Listen address for UDP socket
    pub listen_address: String,
    /// Auto-launch the Python tracker subprocess
    pub auto_launch: bool,
    /// Path to hand_tracker.py script
    pub tracker_script: String,
    /// Camera device index
    pub camera_device: u32,
    /// Camera capture width; also the pixel scale for pinch midpoints
    pub capture_width: u32,
    /// Camera capture height; also the pixel scale for pinch midpoints
    pub capture_height: u32,
    /// Camera capture FPS
    pub capture_fps: u32,
    /// MediaPipe hand detection confidence
    pub min_detection_confidence: f32,
    /// MediaPipe hand tracking confidence
    pub min_tracking_confidence: f32,
    /// Swap Left/Right labels (mirrored camera)
    pub mirror_labels: bool,
    /// Sleep between receive polls when no frame is pending (ms)
    pub poll_interval_ms: u64,
    /// Auto-restart subprocess on crash
    pub auto_restart: bool,
    /// Delay before restarting crashed subprocess (seconds)
    pub restart_delay_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            port: 12347,
            listen_address: "127.0.0.1".to_string(),
            auto_launch: false,
            tracker_script: "scripts/hand_tracker.py".to_string(),
            camera_device: 0,
            capture_width: 640,
            capture_height: 480,
            capture_fps: 30,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
            mirror_labels: false,
            poll_interval_ms: 5,
            auto_restart: true,
            restart_delay_secs: 3,
        }
    }
}

/// Outbound control channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Consumer host
    pub host: String,
    /// Consumer TCP port
    pub port: u16,
    /// Messages buffered between the frame loop and the sender task
    pub queue_capacity: usize,
    /// Connect timeout (ms)
    pub connect_timeout_ms: u64,
    /// Per-line write timeout (ms)
    pub write_timeout_ms: u64,
    /// Minimum delay between connection attempts (ms)
    pub reconnect_delay_ms: u64,
    /// Emit `Drag:<x>,<y>` lines while dragging
    pub drag_updates: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 65432,
            queue_capacity: 64,
            connect_timeout_ms: 500,
            write_timeout_ms: 100,
            reconnect_delay_ms: 1000,
            drag_updates: true,
        }
    }
}

impl ChannelConfig {
    /// `host:port` of the consumer
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Relay (consumer process) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the channel listener binds to
    pub listen_address: String,
    /// Port the channel listener binds to
    pub listen_port: u16,
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            listen_port: 65432,
            http_host: "127.0.0.1".to_string(),
            http_port: 5000,
            cors_enabled: true,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("pinchwire");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/pinchwire");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/pinchwire");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("pinchwire");
        }
    }

    PathBuf::from(".")
}
