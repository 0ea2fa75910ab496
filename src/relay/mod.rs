//! Relay module
//!
//! The consumer end of the control channel. Accepts one tracker connection
//! at a time, keeps the latest mode line and the latest drag line, and
//! serves both to polling clients over HTTP.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::error::{PinchwireError, RelayError};
use crate::output::event::{classify_line, ChannelLine};

/// Value served before anything has been received
pub const NO_DATA: &str = "No Data";

/// Latest values received from the tracker
#[derive(Debug)]
pub struct RelayState {
    mode: RwLock<String>,
    drag: RwLock<String>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayState {
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            mode: RwLock::new(NO_DATA.to_string()),
            drag: RwLock::new(NO_DATA.to_string()),
            shutdown_tx,
        })
    }

    /// Store one received line in the matching slot
    pub async fn ingest_line(&self, line: &str) {
        match classify_line(line) {
            Some(ChannelLine::Mode(mode)) => {
                info!("Updated mode: {}", mode);
                *self.mode.write().await = mode.to_string();
            }
            Some(ChannelLine::Drag(drag)) => {
                debug!("Updated drag: {}", drag);
                *self.drag.write().await = drag.to_string();
            }
            None => {}
        }
    }

    /// Last mode line
    pub async fn mode(&self) -> String {
        self.mode.read().await.clone()
    }

    /// Last drag line
    pub async fn drag(&self) -> String {
        self.drag.read().await.clone()
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

/// TCP listener for the tracker's control channel
pub struct ChannelListener {
    state: Arc<RelayState>,
    listener: TcpListener,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ChannelListener {
    /// Bind the listener
    pub async fn bind(addr: &str, state: Arc<RelayState>) -> Result<Self, PinchwireError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Bind(format!("{}: {}", addr, e)))?;

        info!("Relay listening for tracker on {}", addr);
        let shutdown_rx = state.subscribe_shutdown();
        Ok(Self {
            state,
            listener,
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Serve tracker connections one after another until shutdown
    pub async fn run(mut self) -> Result<(), PinchwireError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            info!("Tracker connected from {}", peer);
                            match self.serve_connection(stream).await {
                                Ok(true) => info!("Tracker {} disconnected", peer),
                                Ok(false) => break,
                                Err(e) => warn!("Tracker {} connection error: {}", peer, e),
                            }
                        }
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => break,
            }
        }

        info!("Relay listener stopped");
        Ok(())
    }

    /// Read lines until EOF (`Ok(true)`) or shutdown (`Ok(false)`).
    /// A fragment cut off by the tracker's write timeout is never stored.
    async fn serve_connection(&mut self, stream: TcpStream) -> Result<bool, PinchwireError> {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        loop {
            line.clear();
            tokio::select! {
                read = reader.read_line(&mut line) => {
                    match read {
                        Ok(0) => return Ok(true),
                        Ok(_) if line.ends_with('\n') => self.state.ingest_line(&line).await,
                        Ok(_) => {
                            debug!("Discarded unterminated fragment '{}'", line);
                            return Ok(true);
                        }
                        Err(e) => return Err(RelayError::Connection(e.to_string()).into()),
                    }
                }
                _ = self.shutdown_rx.recv() => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_initial_state() {
        let state = RelayState::new();
        assert_eq!(state.mode().await, NO_DATA);
        assert_eq!(state.drag().await, NO_DATA);
    }

    #[tokio::test]
    async fn test_ingest_routes_lines() {
        let state = RelayState::new();
        state.ingest_line("Right: Select Mode").await;
        state.ingest_line("Drag:10.0000,20.0000").await;
        state.ingest_line("").await;

        assert_eq!(state.mode().await, "Right: Select Mode");
        assert_eq!(state.drag().await, "Drag:10.0000,20.0000");

        // A drag line never overwrites the mode
        state.ingest_line("Drag:11.0000,20.0000").await;
        assert_eq!(state.mode().await, "Right: Select Mode");
    }

    async fn wait_for_mode(state: &RelayState, expected: &str) {
        for _ in 0..200 {
            if state.mode().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("mode never became {expected}");
    }

    async fn wait_for_drag(state: &RelayState, expected: &str) {
        for _ in 0..200 {
            if state.drag().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("drag never became {expected}");
    }

    #[tokio::test]
    async fn test_cut_off_line_is_not_stored() {
        let state = RelayState::new();
        let listener = ChannelListener::bind("127.0.0.1:0", state.clone()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(listener.run());

        // Tracker gave up mid-write and dropped the connection
        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"Right: Select Mode\nRight: Sel").await.unwrap();
        drop(first);

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"Drag:3.0000,4.0000\n").await.unwrap();
        wait_for_drag(&state, "Drag:3.0000,4.0000").await;
        assert_eq!(state.mode().await, "Right: Select Mode");

        state.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_accepts_reconnect() {
        let state = RelayState::new();
        let listener = ChannelListener::bind("127.0.0.1:0", state.clone()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(listener.run());

        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"Left: Double Tap Mode\nDrag:1.0000,2.0000\n").await.unwrap();
        wait_for_mode(&state, "Left: Double Tap Mode").await;
        assert_eq!(state.drag().await, "Drag:1.0000,2.0000");
        drop(first);

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"Left: Normal Mode\n").await.unwrap();
        wait_for_mode(&state, "Left: Normal Mode").await;

        state.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
