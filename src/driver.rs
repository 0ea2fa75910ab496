//! Frame loop driver
//!
//! Pulls hand frames from a [`FrameSource`], feeds them through the
//! [`GestureTracker`] and queues the resulting messages on the control
//! channel. This is the only writer of gesture state.

use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::gesture::{GestureTracker, HandSample};
use crate::output::{ChannelSender, OutboundMessage};
use crate::tracking::{FrameSource, HandFrame};

/// Upper bound on frames handled per tick, so shutdown stays responsive
const MAX_FRAMES_PER_TICK: usize = 64;

/// Back-off after a frame source error
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How far a mapped capture time may run ahead of the local clock
const MAX_CLOCK_LEAD_SECS: f64 = 1.0;

/// Maps tracker capture stamps onto the local clock.
///
/// The offset is fixed by the first stamped frame, so frames that queued up
/// behind a slow tick keep their real spacing. A stamp that would move time
/// backwards or too far ahead (tracker restarted, clocks drifted) re-anchors
/// the offset. Returned times never decrease.
#[derive(Debug, Default)]
struct CaptureClock {
    offset: Option<f64>,
    last: f64,
}

impl CaptureClock {
    fn frame_time(&mut self, captured_at: Option<f64>, local: f64) -> f64 {
        let t = match captured_at {
            Some(stamp) => match self.offset.map(|offset| stamp + offset) {
                Some(mapped) if mapped >= self.last && mapped <= local + MAX_CLOCK_LEAD_SECS => mapped,
                _ => {
                    if self.offset.is_some() {
                        debug!("Capture clock re-anchored at {:.3}", stamp);
                    }
                    self.offset = Some(local - stamp);
                    local
                }
            },
            None => local,
        };

        self.last = t.max(self.last);
        self.last
    }
}

pub struct FrameLoop<S: FrameSource> {
    source: S,
    tracker: GestureTracker,
    frame_width: f64,
    frame_height: f64,
    drag_updates: bool,
    poll_interval: Duration,
    started: Instant,
    clock: CaptureClock,
    frames: u64,
}

impl<S: FrameSource> FrameLoop<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            tracker: GestureTracker::new(config.gesture.clone()),
            frame_width: config.tracking.capture_width as f64,
            frame_height: config.tracking.capture_height as f64,
            drag_updates: config.channel.drag_updates,
            poll_interval: Duration::from_millis(config.tracking.poll_interval_ms),
            started: Instant::now(),
            clock: CaptureClock::default(),
            frames: 0,
        }
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    /// Frames handled so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Classify one frame at time `now` (seconds) and return what to send
    pub fn handle_frame(&mut self, frame: &HandFrame, now: f64) -> Vec<OutboundMessage> {
        self.frames += 1;

        let samples: Vec<HandSample> = frame
            .hands
            .iter()
            .map(|hand| hand.sample(self.frame_width, self.frame_height))
            .collect();

        let mut messages: Vec<OutboundMessage> = self
            .tracker
            .process_frame(&samples, now)
            .iter()
            .map(OutboundMessage::from_change)
            .collect();

        let drag = self.tracker.drag();
        if self.drag_updates && drag.is_dragging() {
            if let Some(point) = drag.last_pinch_point() {
                messages.push(OutboundMessage::Drag(point));
            }
        }

        messages
    }

    /// Run until shutdown. Returns the loop so callers can inspect final state.
    pub async fn run(mut self, sender: ChannelSender, mut shutdown_rx: broadcast::Receiver<()>) -> Self {
        info!(
            "Frame loop started ({}x{} px, drag updates: {})",
            self.frame_width, self.frame_height, self.drag_updates
        );

        loop {
            let delay = self.drain(&sender);

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Frame loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            "Frame loop stopped after {} frames ({} messages dropped)",
            self.frames,
            sender.dropped()
        );
        self
    }

    /// Handle every pending frame; returns how long to wait before the next poll
    fn drain(&mut self, sender: &ChannelSender) -> Duration {
        for _ in 0..MAX_FRAMES_PER_TICK {
            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    let local = self.started.elapsed().as_secs_f64();
                    let now = self.clock.frame_time(frame.captured_at, local);
                    for msg in self.handle_frame(&frame, now) {
                        if let OutboundMessage::Drag(_) = msg {
                            debug!("{}", msg);
                        }
                        sender.emit(msg);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // Transient: skip this cycle, try again next tick
                    warn!("Frame source error: {}", e);
                    return ERROR_BACKOFF;
                }
            }
        }
        self.poll_interval
    }
}
