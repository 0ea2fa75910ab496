//! Pinchwire - Two-handed pinch gesture controller
//!
//! Turns MediaPipe hand landmarks into discrete interaction modes:
//! - Right hand double-tap toggles a select mode, a long pinch exits it
//! - Left hand double-tap toggles a double-tap mode, a long pinch starts a drag
//! - Mode changes and drag positions go out as text lines over TCP
//! - A small relay process exposes the latest values over HTTP

pub mod config;
pub mod driver;
pub mod error;
pub mod gesture;
pub mod output;
pub mod relay;
pub mod tracking;

pub use config::Config;
pub use error::{PinchwireError, Result};

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Application state shared across the tracker's tasks
#[derive(Debug)]
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            config: RwLock::new(config),
            shutdown_tx,
        })
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
