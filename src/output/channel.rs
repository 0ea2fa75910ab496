//! Outbound control channel
//!
//! The frame loop never touches the socket. It pushes messages into a bounded
//! queue with [`ChannelSender::emit`], which never waits; a dedicated task
//! drains the queue and writes lines to the consumer over TCP. When the queue
//! is full the newest message is dropped. Connect and write both have
//! timeouts, and a failed write drops the connection so the next message
//! reconnects.
//!
//! Drag lines are disposable, mode lines are not. The latest mode of each
//! hand is kept in a [`ModeLedger`] outside the queue. Every new connection
//! starts with a replay of the ledger, and a mode line that could not be
//! queued or written marks the ledger stale so the task replays it as soon
//! as the consumer is reachable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::gesture::{HandLabel, HandMode};
use crate::output::event::OutboundMessage;

/// Latest mode per hand, shared by the producer handle and the sender task
#[derive(Debug, Default)]
struct ModeLedger {
    latest: Mutex<[Option<HandMode>; 2]>,
    stale: AtomicBool,
}

impl ModeLedger {
    fn slot(hand: HandLabel) -> usize {
        match hand {
            HandLabel::Left => 0,
            HandLabel::Right => 1,
        }
    }

    fn record(&self, hand: HandLabel, mode: HandMode) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest[Self::slot(hand)] = Some(mode);
    }

    /// One mode message per hand that has ever changed mode
    fn snapshot(&self) -> Vec<OutboundMessage> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        HandLabel::ALL
            .iter()
            .filter_map(|&hand| latest[Self::slot(hand)].map(|mode| OutboundMessage::Mode { hand, mode }))
            .collect()
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }

    fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }
}

/// Producer handle for the control channel
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<OutboundMessage>,
    ledger: Arc<ModeLedger>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSender {
    /// Spawn the sender task. It exits on shutdown or once every
    /// `ChannelSender` clone has been dropped.
    pub fn spawn(config: &ChannelConfig, shutdown_rx: broadcast::Receiver<()>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let ledger = Arc::new(ModeLedger::default());
        let dropped = Arc::new(AtomicU64::new(0));
        let task = SenderTask::new(config, rx, shutdown_rx, ledger.clone(), dropped.clone());
        let handle = tokio::spawn(task.run());

        (Self { tx, ledger, dropped }, handle)
    }

    /// Queue a message without waiting. Returns false if it was dropped.
    ///
    /// A dropped mode message is not lost: the sender task replays the
    /// latest mode of each hand once it gets the chance.
    pub fn emit(&self, msg: OutboundMessage) -> bool {
        if let OutboundMessage::Mode { hand, mode } = msg {
            self.ledger.record(hand, mode);
        }

        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if let OutboundMessage::Mode { .. } = msg {
                    self.ledger.mark_stale();
                }
                debug!("Outbound queue full, dropped '{}' ({} total)", msg, total);
                false
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                debug!("Outbound channel closed, dropped '{}'", msg);
                false
            }
        }
    }

    /// Messages dropped so far, whether the queue was full or the consumer
    /// could not be reached
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

struct SenderTask {
    addr: String,
    connect_timeout: Duration,
    write_timeout: Duration,
    reconnect_delay: Duration,
    rx: mpsc::Receiver<OutboundMessage>,
    shutdown_rx: broadcast::Receiver<()>,
    ledger: Arc<ModeLedger>,
    dropped: Arc<AtomicU64>,
    stream: Option<TcpStream>,
    last_attempt: Option<Instant>,
}

impl SenderTask {
    fn new(
        config: &ChannelConfig,
        rx: mpsc::Receiver<OutboundMessage>,
        shutdown_rx: broadcast::Receiver<()>,
        ledger: Arc<ModeLedger>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            addr: config.address(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            rx,
            shutdown_rx,
            ledger,
            dropped,
            stream: None,
            last_attempt: None,
        }
    }

    async fn run(mut self) {
        info!("Control channel sender started (consumer: {})", self.addr);

        loop {
            let stale = self.ledger.is_stale();

            tokio::select! {
                msg = self.rx.recv() => {
                    match msg {
                        Some(msg) => match self.deliver(&msg).await {
                            Ok(()) if self.ledger.is_stale() => {
                                // Connected right now, so catch up without waiting for the timer
                                if let Err(e) = self.resync().await {
                                    warn!("Mode resync with {} failed: {}", self.addr, e);
                                }
                            }
                            Ok(()) => {}
                            Err(e) => {
                                self.dropped.fetch_add(1, Ordering::Relaxed);
                                if let OutboundMessage::Mode { .. } = msg {
                                    self.ledger.mark_stale();
                                }
                                match e {
                                    ChannelError::NotConnected(_) => debug!("Dropped '{}': {}", msg, e),
                                    _ => warn!("Failed to send '{}' to {}: {}", msg, self.addr, e),
                                }
                            }
                        },
                        None => break,
                    }
                }
                _ = tokio::time::sleep(self.reconnect_delay), if stale => {
                    if let Err(e) = self.resync().await {
                        debug!("Mode resync with {} failed: {}", self.addr, e);
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Control channel sender shutting down");
                    break;
                }
            }
        }

        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        info!("Control channel sender stopped");
    }

    async fn deliver(&mut self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let mut stream = self.connect().await?;
                self.replay(&mut stream).await?;
                // The replay already carries this mode or a newer one
                if let OutboundMessage::Mode { .. } = msg {
                    self.stream = Some(stream);
                    return Ok(());
                }
                stream
            }
        };

        // Either way a failed write drops the stream and the next message reconnects
        write_line(&mut stream, msg, self.write_timeout).await?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Replay the ledger on the open stream, connecting first if needed
    async fn resync(&mut self) -> Result<(), ChannelError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };
        self.replay(&mut stream).await?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn replay(&mut self, stream: &mut TcpStream) -> Result<(), ChannelError> {
        // Cleared before the snapshot, so a mode recorded meanwhile re-marks it
        self.ledger.take_stale();

        for msg in self.ledger.snapshot() {
            if let Err(e) = write_line(stream, &msg, self.write_timeout).await {
                self.ledger.mark_stale();
                return Err(e);
            }
            debug!("Replayed '{}'", msg);
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<TcpStream, ChannelError> {
        if let Some(last) = self.last_attempt {
            let since = last.elapsed();
            if since < self.reconnect_delay {
                let wait = self.reconnect_delay - since;
                return Err(ChannelError::NotConnected(wait.as_millis() as u64));
            }
        }
        self.last_attempt = Some(Instant::now());

        match timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                info!("Connected to consumer at {}", self.addr);
                Ok(stream)
            }
            Ok(Err(e)) => Err(ChannelError::Connect {
                addr: self.addr.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(ChannelError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }
}

async fn write_line(stream: &mut TcpStream, msg: &OutboundMessage, limit: Duration) -> Result<(), ChannelError> {
    let line = format!("{}\n", msg);
    match timeout(limit, stream.write_all(line.as_bytes())).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ChannelError::Write(e.to_string())),
        Err(_) => Err(ChannelError::Timeout(limit.as_millis() as u64)),
    }
}
