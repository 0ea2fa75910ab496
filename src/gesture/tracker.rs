//! Per-hand pinch/tap/hold state machine
//!
//! Each frame, every detected hand's pinch distance is reduced to a contact
//! flag and compared with the previous frame:
//!
//! | Edge | Right hand | Left hand |
//! |---|---|---|
//! | rising, within double-tap window | toggle `Select` | toggle `DoubleTap` |
//! | sustained | hold >= right timeout in `Select` → `Normal` | hold >= left timeout → `Move`, then sample drag |
//! | falling | nothing | nothing |
//! | sustained release | nothing | in `Move`, idle > left timeout → `Normal` |
//!
//! A frame without any hands drops the drag and forces Left back to `Normal`.
//! Right is left alone unless `reset_right_on_empty_frame` is set.

use tracing::{debug, info};

use super::drag::DragState;
use super::hand::{HandLabel, HandMode, HandState};
use super::metric::PinchMetric;
use crate::config::GestureConfig;

/// One detected hand's metric for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    pub label: HandLabel,
    pub metric: PinchMetric,
}

/// Why a mode changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    DoubleTap,
    HoldTimeout,
    DragStart,
    DragTimeout,
    HandsLost,
}

/// A single mode transition on one hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub hand: HandLabel,
    pub from: HandMode,
    pub to: HandMode,
    pub cause: TransitionCause,
}

/// Owns both hands' state and the Left-hand drag.
///
/// Single writer: only the frame loop mutates it, so nothing here locks.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    left: HandState,
    right: HandState,
    drag: DragState,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            left: HandState::new(HandLabel::Left),
            right: HandState::new(HandLabel::Right),
            drag: DragState::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn hand(&self, label: HandLabel) -> &HandState {
        match label {
            HandLabel::Left => &self.left,
            HandLabel::Right => &self.right,
        }
    }

    fn hand_mut(&mut self, label: HandLabel) -> &mut HandState {
        match label {
            HandLabel::Left => &mut self.left,
            HandLabel::Right => &mut self.right,
        }
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Feed one whole frame. An empty frame triggers the no-hands reset.
    pub fn process_frame(&mut self, samples: &[HandSample], now: f64) -> Vec<ModeChange> {
        if samples.is_empty() {
            return self.reset_no_hands();
        }

        samples
            .iter()
            .filter_map(|s| self.update(s.label, &s.metric, now))
            .collect()
    }

    /// Advance one hand by one frame, returning the mode change if any
    pub fn update(&mut self, label: HandLabel, metric: &PinchMetric, now: f64) -> Option<ModeChange> {
        let contact = metric.distance < self.config.tap_threshold;

        match (contact, self.hand(label).is_pinching) {
            (true, false) => self.on_pinch_start(label, now),
            (true, true) => self.on_pinch_held(label, metric, now),
            (false, true) => {
                self.hand_mut(label).is_pinching = false;
                None
            }
            (false, false) => self.on_released(label, now),
        }
    }

    /// No hands in frame: stop any drag and put Left back to `Normal`
    pub fn reset_no_hands(&mut self) -> Vec<ModeChange> {
        self.drag.release();

        let mut changes = Vec::new();
        changes.extend(self.transition(HandLabel::Left, HandMode::Normal, TransitionCause::HandsLost));
        if self.config.reset_right_on_empty_frame {
            changes.extend(self.transition(
                HandLabel::Right,
                HandMode::Normal,
                TransitionCause::HandsLost,
            ));
        }
        changes
    }

    fn on_pinch_start(&mut self, label: HandLabel, now: f64) -> Option<ModeChange> {
        let window = self.config.double_tap_window_secs;
        let state = self.hand_mut(label);
        state.is_pinching = true;
        state.tap_hold_start = Some(now);

        let is_double = state.last_tap_time.is_some_and(|t| now - t < window);
        if !is_double {
            state.last_tap_time = Some(now);
            return None;
        }

        // Consume the pair so a third quick pinch starts a fresh sequence
        state.last_tap_time = None;

        if label == HandLabel::Left
            && self.left.mode == HandMode::Move
            && self.config.guard_double_tap_in_move
        {
            debug!("Left double-tap ignored while dragging");
            return None;
        }

        let to = match (label, self.hand(label).mode) {
            (HandLabel::Right, HandMode::Select) => HandMode::Normal,
            (HandLabel::Right, _) => HandMode::Select,
            (HandLabel::Left, HandMode::DoubleTap) => HandMode::Normal,
            (HandLabel::Left, _) => HandMode::DoubleTap,
        };
        self.transition(label, to, TransitionCause::DoubleTap)
    }

    fn on_pinch_held(&mut self, label: HandLabel, metric: &PinchMetric, now: f64) -> Option<ModeChange> {
        let held = self.hand(label).hold_duration(now).unwrap_or(0.0);

        match label {
            HandLabel::Right => {
                if self.right.mode == HandMode::Select && held >= self.config.right_hold_timeout_secs {
                    self.transition(label, HandMode::Normal, TransitionCause::HoldTimeout)
                } else {
                    None
                }
            }
            HandLabel::Left => {
                let mut change = None;
                if held >= self.config.left_hold_timeout_secs && self.left.mode != HandMode::Move {
                    change = self.transition(label, HandMode::Move, TransitionCause::DragStart);
                    self.drag.begin(metric.midpoint);
                }
                if self.left.mode == HandMode::Move {
                    self.drag.sample(metric.midpoint, metric.distance, now);
                    if let (Some(vector), Some(length)) = (self.drag.vector(), self.drag.length()) {
                        debug!("Dragging vector: ({:.2}, {:.2}), length: {:.2}", vector.x, vector.y, length);
                    }
                }
                change
            }
        }
    }

    fn on_released(&mut self, label: HandLabel, now: f64) -> Option<ModeChange> {
        if label == HandLabel::Left
            && self.left.mode == HandMode::Move
            && self.drag.idle_for(now) > self.config.left_hold_timeout_secs
        {
            self.drag.release();
            return self.transition(label, HandMode::Normal, TransitionCause::DragTimeout);
        }
        None
    }

    fn transition(&mut self, label: HandLabel, to: HandMode, cause: TransitionCause) -> Option<ModeChange> {
        debug_assert!(to.is_valid_for(label));

        let state = self.hand_mut(label);
        let from = state.mode;
        if from == to {
            return None;
        }
        state.mode = to;

        info!("{} hand: {} -> {} ({:?})", label, from, to, cause);
        Some(ModeChange {
            hand: label,
            from,
            to,
            cause,
        })
    }
}
