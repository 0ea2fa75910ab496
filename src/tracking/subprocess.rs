//! Hand tracker subprocess manager
//!
//! Launches and manages the Python MediaPipe hand tracker as a child process
//! with automatic cleanup on drop.

use tokio::process::{Child, Command};

use crate::config::TrackingConfig;
use crate::error::{PinchwireError, TrackingError};

/// Manages a hand tracker subprocess (scripts/hand_tracker.py)
pub struct TrackerSubprocess {
    child: Option<Child>,
    config: TrackingConfig,
}

impl TrackerSubprocess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
        }
    }

    /// Command-line arguments passed to the tracker script
    pub fn args(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            c.tracker_script.clone(),
            "--ip".to_string(),
            c.listen_address.clone(),
            "--port".to_string(),
            c.port.to_string(),
            "--capture".to_string(),
            c.camera_device.to_string(),
            "--width".to_string(),
            c.capture_width.to_string(),
            "--height".to_string(),
            c.capture_height.to_string(),
            "--fps".to_string(),
            c.capture_fps.to_string(),
            "--min-detection-confidence".to_string(),
            c.min_detection_confidence.to_string(),
            "--min-tracking-confidence".to_string(),
            c.min_tracking_confidence.to_string(),
        ]
    }

    /// Launch the tracker subprocess.
    pub fn start(&mut self) -> Result<(), PinchwireError> {
        if self.is_running() {
            return Ok(());
        }

        let child = Command::new("python3")
            .args(self.args())
            .kill_on_drop(true)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                TrackingError::Subprocess(format!(
                    "Failed to launch hand tracker at '{}': {}",
                    self.config.tracker_script, e
                ))
            })?;

        tracing::info!(
            "Hand tracker subprocess started (pid: {:?}, camera: {}, port: {})",
            child.id(),
            self.config.camera_device,
            self.config.port,
        );

        self.child = Some(child);
        Ok(())
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Hand tracker subprocess exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check hand tracker status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Stop the subprocess by killing it
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping hand tracker subprocess (pid: {:?})", child.id());
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
    }
}

/// Check if the `mediapipe` Python package is available.
///
/// Runs `python3 -c "import mediapipe"` and returns true if it succeeds.
pub fn check_mediapipe_available() -> bool {
    match std::process::Command::new("python3")
        .args(["-c", "import mediapipe"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let config = TrackingConfig {
            port: 4000,
            camera_device: 2,
            ..TrackingConfig::default()
        };
        let sp = TrackerSubprocess::new(&config);
        let args = sp.args();

        assert_eq!(args[0], "scripts/hand_tracker.py");
        let port = args.iter().position(|a| a == "--port").unwrap();
        assert_eq!(args[port + 1], "4000");
        let capture = args.iter().position(|a| a == "--capture").unwrap();
        assert_eq!(args[capture + 1], "2");
        assert!(args.contains(&"--min-detection-confidence".to_string()));
    }

    #[test]
    fn test_not_running_before_start() {
        let mut sp = TrackerSubprocess::new(&TrackingConfig::default());
        assert!(!sp.is_running());
    }
}
