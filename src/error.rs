//! Error types for Pinchwire

use thiserror::Error;

/// Main error type for Pinchwire
#[derive(Error, Debug)]
pub enum PinchwireError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Landmark source errors (UDP receiver + tracker subprocess)
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Landmark receiver error: {0}")]
    Receiver(String),

    #[error("Landmark parse error: {0}")]
    Parse(String),

    #[error("Tracker subprocess error: {0}")]
    Subprocess(String),
}

/// Outbound control channel errors
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to connect to {addr}: {message}")]
    Connect { addr: String, message: String },

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Not connected, next attempt in {0} ms")]
    NotConnected(u64),
}

/// Relay (consumer side) errors
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type alias for Pinchwire operations
pub type Result<T> = std::result::Result<T, PinchwireError>;
