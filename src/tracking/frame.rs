//! Per-frame landmark types and the frame source seam

use crate::error::PinchwireError;
use crate::gesture::{pinch_metric, HandLabel, HandSample, Point2};

/// Thumb and index fingertips of one hand, normalized camera coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPair {
    pub thumb: Point2,
    pub index: Point2,
}

/// One detected hand in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedHand {
    pub label: HandLabel,
    pub landmarks: LandmarkPair,
}

impl DetectedHand {
    /// Pinch metric with the midpoint scaled to a `width` x `height` frame
    pub fn sample(&self, width: f64, height: f64) -> HandSample {
        HandSample {
            label: self.label,
            metric: pinch_metric(self.landmarks.thumb, self.landmarks.index).in_frame(width, height),
        }
    }
}

/// Everything the pose estimator reported for one frame.
///
/// Labels are unique within a frame; an empty `hands` means no hand is visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<DetectedHand>,
    /// Tracker's monotonic clock at capture, seconds. Only comparable with
    /// other stamps from the same tracker process.
    pub captured_at: Option<f64>,
}

impl HandFrame {
    pub fn new(hands: Vec<DetectedHand>) -> Self {
        Self {
            hands,
            captured_at: None,
        }
    }

    pub fn with_capture_time(mut self, captured_at: f64) -> Self {
        self.captured_at = Some(captured_at).filter(|t| t.is_finite());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    pub fn hand(&self, label: HandLabel) -> Option<&DetectedHand> {
        self.hands.iter().find(|h| h.label == label)
    }
}

/// Anything that yields hand frames.
///
/// `next_frame` must not block: `Ok(None)` means nothing is pending right now
/// and the caller should try again on the next tick.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<HandFrame>, PinchwireError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_scales_midpoint() {
        let hand = DetectedHand {
            label: HandLabel::Left,
            landmarks: LandmarkPair {
                thumb: Point2::new(0.25, 0.5),
                index: Point2::new(0.75, 0.5),
            },
        };

        let sample = hand.sample(640.0, 480.0);
        assert_eq!(sample.label, HandLabel::Left);
        assert!((sample.metric.distance - 0.5).abs() < 1e-12);
        assert_eq!(sample.metric.midpoint, Point2::new(320.0, 240.0));
    }

    #[test]
    fn test_frame_lookup() {
        let frame = HandFrame::new(vec![DetectedHand {
            label: HandLabel::Right,
            landmarks: LandmarkPair {
                thumb: Point2::new(0.1, 0.1),
                index: Point2::new(0.2, 0.2),
            },
        }]);

        assert!(!frame.is_empty());
        assert!(frame.hand(HandLabel::Right).is_some());
        assert!(frame.hand(HandLabel::Left).is_none());
        assert!(HandFrame::default().is_empty());
    }
}
