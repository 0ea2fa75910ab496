//! Outbound line protocol
//!
//! One UTF-8 message per line, no length prefix:
//! - mode events, fixed literals such as `Right: Select Mode`
//! - drag updates, `Drag:<x>,<y>` with four decimal places

use crate::gesture::{HandLabel, HandMode, ModeChange, Point2};

/// Prefix that marks a drag update line
pub const DRAG_PREFIX: &str = "Drag:";

/// Wire literal for a hand entering a mode
pub fn mode_literal(hand: HandLabel, mode: HandMode) -> Option<&'static str> {
    match (hand, mode) {
        (HandLabel::Right, HandMode::Select) => Some("Right: Select Mode"),
        (HandLabel::Right, HandMode::Normal) => Some("Right: Normal Mode"),
        (HandLabel::Left, HandMode::DoubleTap) => Some("Left: Double Tap Mode"),
        (HandLabel::Left, HandMode::Normal) => Some("Left: Normal Mode"),
        (HandLabel::Left, HandMode::Move) => Some("Left: Move Mode"),
        _ => None,
    }
}

/// A message queued for the external consumer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundMessage {
    /// A hand changed mode
    Mode { hand: HandLabel, mode: HandMode },
    /// Current drag position (pinch midpoint, pixels)
    Drag(Point2),
}

impl OutboundMessage {
    pub fn from_change(change: &ModeChange) -> Self {
        OutboundMessage::Mode {
            hand: change.hand,
            mode: change.to,
        }
    }

    /// Serialized line, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboundMessage::Mode { hand, mode } => match mode_literal(*hand, *mode) {
                Some(literal) => f.write_str(literal),
                None => write!(f, "{}: {} Mode", hand, mode),
            },
            OutboundMessage::Drag(p) => write!(f, "{}{:.4},{:.4}", DRAG_PREFIX, p.x, p.y),
        }
    }
}

/// A received line, classified for the consumer's two slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLine<'a> {
    Mode(&'a str),
    Drag(&'a str),
}

/// Classify one received line. Blank lines are ignored.
pub fn classify_line(line: &str) -> Option<ChannelLine<'_>> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if line.starts_with(DRAG_PREFIX) {
        Some(ChannelLine::Drag(line))
    } else {
        Some(ChannelLine::Mode(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::TransitionCause;

    #[test]
    fn test_double_tap_literals() {
        let line = |hand, mode| OutboundMessage::Mode { hand, mode }.to_line();
        assert_eq!(line(HandLabel::Right, HandMode::Select), "Right: Select Mode");
        assert_eq!(line(HandLabel::Right, HandMode::Normal), "Right: Normal Mode");
        assert_eq!(line(HandLabel::Left, HandMode::DoubleTap), "Left: Double Tap Mode");
        assert_eq!(line(HandLabel::Left, HandMode::Normal), "Left: Normal Mode");
        assert_eq!(line(HandLabel::Left, HandMode::Move), "Left: Move Mode");
    }

    #[test]
    fn test_literals_cover_every_reachable_mode() {
        for hand in HandLabel::ALL {
            for mode in [HandMode::Normal, HandMode::Select, HandMode::DoubleTap, HandMode::Move] {
                assert_eq!(mode_literal(hand, mode).is_some(), mode.is_valid_for(hand));
            }
        }
    }

    #[test]
    fn test_from_change_uses_new_mode() {
        let change = ModeChange {
            hand: HandLabel::Right,
            from: HandMode::Select,
            to: HandMode::Normal,
            cause: TransitionCause::HoldTimeout,
        };
        assert_eq!(OutboundMessage::from_change(&change).to_line(), "Right: Normal Mode");
    }

    #[test]
    fn test_drag_format() {
        let msg = OutboundMessage::Drag(Point2::new(320.0, 240.5));
        assert_eq!(msg.to_line(), "Drag:320.0000,240.5000");

        let msg = OutboundMessage::Drag(Point2::new(0.123456, 1.0 / 3.0));
        assert_eq!(msg.to_line(), "Drag:0.1235,0.3333");
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("Right: Select Mode\n"), Some(ChannelLine::Mode("Right: Select Mode")));
        assert_eq!(classify_line("Drag:1.0000,2.0000\r"), Some(ChannelLine::Drag("Drag:1.0000,2.0000")));
        assert_eq!(classify_line("   "), None);
        assert_eq!(classify_line(""), None);
    }
}
