//! Left-hand drag tracking

use super::metric::Point2;

/// Drag state owned by the Left-hand machine.
///
/// `anchor` is set when Move mode begins and cleared when it ends; the
/// rest is the most recent sample taken while in Move mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragState {
    dragging: bool,
    anchor: Option<Point2>,
    last_pinch_point: Option<Point2>,
    last_pinch_distance: Option<f64>,
    last_drag_time: Option<f64>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn anchor(&self) -> Option<Point2> {
        self.anchor
    }

    pub fn last_pinch_point(&self) -> Option<Point2> {
        self.last_pinch_point
    }

    pub fn last_pinch_distance(&self) -> Option<f64> {
        self.last_pinch_distance
    }

    pub fn last_drag_time(&self) -> Option<f64> {
        self.last_drag_time
    }

    /// Anchor to last pinch point
    pub fn vector(&self) -> Option<Point2> {
        match (self.anchor, self.last_pinch_point) {
            (Some(a), Some(p)) => Some(Point2::new(p.x - a.x, p.y - a.y)),
            _ => None,
        }
    }

    pub fn length(&self) -> Option<f64> {
        match (self.anchor, self.last_pinch_point) {
            (Some(a), Some(p)) => Some(a.distance(&p)),
            _ => None,
        }
    }

    /// Seconds since the last Move-mode sample. No sample counts as
    /// infinitely stale.
    pub fn idle_for(&self, now: f64) -> f64 {
        self.last_drag_time
            .map_or(f64::INFINITY, |t| now - t)
    }

    pub(crate) fn begin(&mut self, anchor: Point2) {
        self.dragging = true;
        self.anchor = Some(anchor);
    }

    pub(crate) fn sample(&mut self, point: Point2, distance: f64, now: f64) {
        self.last_pinch_point = Some(point);
        self.last_pinch_distance = Some(distance);
        self.last_drag_time = Some(now);
    }

    /// Stop dragging and drop the anchor. The last sample is kept.
    pub(crate) fn release(&mut self) {
        self.dragging = false;
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_sample_release() {
        let mut drag = DragState::new();
        assert!(!drag.is_dragging());
        assert!(drag.anchor().is_none());

        drag.begin(Point2::new(100.0, 200.0));
        drag.sample(Point2::new(100.0, 200.0), 0.01, 1.0);
        assert!(drag.is_dragging());
        assert_eq!(drag.anchor(), Some(Point2::new(100.0, 200.0)));
        assert_eq!(drag.last_drag_time(), Some(1.0));

        drag.sample(Point2::new(130.0, 240.0), 0.02, 1.1);
        assert_eq!(drag.vector(), Some(Point2::new(30.0, 40.0)));
        assert_eq!(drag.length(), Some(50.0));
        assert_eq!(drag.last_pinch_distance(), Some(0.02));

        drag.release();
        assert!(!drag.is_dragging());
        assert!(drag.anchor().is_none());
        assert!(drag.vector().is_none());
        assert_eq!(drag.last_pinch_point(), Some(Point2::new(130.0, 240.0)));
    }

    #[test]
    fn test_idle_for() {
        let mut drag = DragState::new();
        assert!(drag.idle_for(5.0).is_infinite());

        drag.sample(Point2::new(0.0, 0.0), 0.0, 2.0);
        assert_eq!(drag.idle_for(2.25), 0.25);
    }
}
