//! Per-hand labels, modes and state

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which physical hand a detection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandLabel {
    Left,
    Right,
}

impl HandLabel {
    pub const ALL: [HandLabel; 2] = [HandLabel::Left, HandLabel::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandLabel::Left => "Left",
            HandLabel::Right => "Right",
        }
    }

    /// The other hand; used when the camera image is mirrored
    pub fn mirrored(&self) -> HandLabel {
        match self {
            HandLabel::Left => HandLabel::Right,
            HandLabel::Right => HandLabel::Left,
        }
    }
}

impl std::fmt::Display for HandLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Left" | "left" => Ok(HandLabel::Left),
            "Right" | "right" => Ok(HandLabel::Right),
            other => Err(format!("unknown hand label: {other}")),
        }
    }
}

/// What a hand is currently doing.
///
/// Right only ever uses `Normal` and `Select`; Left only `Normal`,
/// `DoubleTap` and `Move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HandMode {
    #[default]
    Normal,
    Select,
    DoubleTap,
    Move,
}

impl HandMode {
    /// Whether this mode belongs to the given hand's transition set
    pub fn is_valid_for(&self, label: HandLabel) -> bool {
        matches!(
            (label, self),
            (_, HandMode::Normal)
                | (HandLabel::Right, HandMode::Select)
                | (HandLabel::Left, HandMode::DoubleTap)
                | (HandLabel::Left, HandMode::Move)
        )
    }
}

impl std::fmt::Display for HandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandMode::Normal => write!(f, "normal"),
            HandMode::Select => write!(f, "select"),
            HandMode::DoubleTap => write!(f, "double-tap"),
            HandMode::Move => write!(f, "move"),
        }
    }
}

/// Contact edge detector, tap timers and mode for one hand.
///
/// Timestamps are seconds on the driver's monotonic clock. `None` in
/// `last_tap_time` is the "far past" sentinel: no earlier tap can pair
/// with the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct HandState {
    label: HandLabel,
    pub(crate) mode: HandMode,
    pub(crate) is_pinching: bool,
    pub(crate) tap_hold_start: Option<f64>,
    pub(crate) last_tap_time: Option<f64>,
}

impl HandState {
    pub fn new(label: HandLabel) -> Self {
        Self {
            label,
            mode: HandMode::Normal,
            is_pinching: false,
            tap_hold_start: None,
            last_tap_time: None,
        }
    }

    pub fn label(&self) -> HandLabel {
        self.label
    }

    pub fn mode(&self) -> HandMode {
        self.mode
    }

    pub fn is_pinching(&self) -> bool {
        self.is_pinching
    }

    /// When the current (or most recent) pinch began
    pub fn tap_hold_start(&self) -> Option<f64> {
        self.tap_hold_start
    }

    /// Start of the tap a following pinch could pair with
    pub fn last_tap_time(&self) -> Option<f64> {
        self.last_tap_time
    }

    /// How long the current pinch has been held, if pinching
    pub fn hold_duration(&self, now: f64) -> Option<f64> {
        match (self.is_pinching, self.tap_hold_start) {
            (true, Some(start)) => Some(now - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!("Left".parse::<HandLabel>().unwrap(), HandLabel::Left);
        assert_eq!("right".parse::<HandLabel>().unwrap(), HandLabel::Right);
        assert!("Both".parse::<HandLabel>().is_err());
        assert!("".parse::<HandLabel>().is_err());
    }

    #[test]
    fn test_label_mirrored() {
        assert_eq!(HandLabel::Left.mirrored(), HandLabel::Right);
        assert_eq!(HandLabel::Right.mirrored(), HandLabel::Left);
    }

    #[test]
    fn test_mode_sets() {
        assert!(HandMode::Normal.is_valid_for(HandLabel::Left));
        assert!(HandMode::Normal.is_valid_for(HandLabel::Right));
        assert!(HandMode::Select.is_valid_for(HandLabel::Right));
        assert!(!HandMode::Select.is_valid_for(HandLabel::Left));
        assert!(HandMode::DoubleTap.is_valid_for(HandLabel::Left));
        assert!(!HandMode::DoubleTap.is_valid_for(HandLabel::Right));
        assert!(HandMode::Move.is_valid_for(HandLabel::Left));
        assert!(!HandMode::Move.is_valid_for(HandLabel::Right));
    }

    #[test]
    fn test_new_state() {
        let state = HandState::new(HandLabel::Right);
        assert_eq!(state.label(), HandLabel::Right);
        assert_eq!(state.mode(), HandMode::Normal);
        assert!(!state.is_pinching());
        assert!(state.last_tap_time().is_none());
        assert!(state.hold_duration(1.0).is_none());
    }

    #[test]
    fn test_hold_duration() {
        let mut state = HandState::new(HandLabel::Left);
        state.is_pinching = true;
        state.tap_hold_start = Some(2.0);
        assert_eq!(state.hold_duration(2.75), Some(0.75));

        state.is_pinching = false;
        assert!(state.hold_duration(3.0).is_none());
    }
}
