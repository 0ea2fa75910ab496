//! Thumb/index pinch metric

use serde::{Deserialize, Serialize};

/// A 2D point, either normalized camera coordinates or pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Scale each axis, e.g. normalized coordinates into a `width` x `height` frame
    pub fn scaled(&self, width: f64, height: f64) -> Point2 {
        Point2::new(self.x * width, self.y * height)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Point2::new(p[0], p[1])
    }
}

/// Distance and midpoint of a thumb/index pair in a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchMetric {
    /// Euclidean distance between the tips, in normalized units
    pub distance: f64,
    /// Midpoint of the tips, normalized until scaled with [`PinchMetric::in_frame`]
    pub midpoint: Point2,
}

impl PinchMetric {
    /// Same metric with the midpoint moved into pixel space. The distance
    /// stays normalized since the contact threshold is expressed that way.
    pub fn in_frame(&self, width: f64, height: f64) -> PinchMetric {
        PinchMetric {
            distance: self.distance,
            midpoint: self.midpoint.scaled(width, height),
        }
    }
}

/// Compute the pinch metric for one hand
pub fn pinch_metric(thumb: Point2, index: Point2) -> PinchMetric {
    PinchMetric {
        distance: thumb.distance(&index),
        midpoint: Point2::new((thumb.x + index.x) * 0.5, (thumb.y + index.y) * 0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_midpoint() {
        let m = pinch_metric(Point2::new(0.0, 0.0), Point2::new(0.3, 0.4));
        assert!((m.distance - 0.5).abs() < 1e-12);
        assert_eq!(m.midpoint, Point2::new(0.15, 0.2));
    }

    #[test]
    fn test_symmetric() {
        let a = Point2::new(0.42, 0.61);
        let b = Point2::new(0.47, 0.58);
        let ab = pinch_metric(a, b);
        let ba = pinch_metric(b, a);
        assert_eq!(ab.distance, ba.distance);
        assert_eq!(ab.midpoint, ba.midpoint);
    }

    #[test]
    fn test_reproducible() {
        let a = Point2::new(0.123456789, 0.987654321);
        let b = Point2::new(0.135792468, 0.975318642);
        let first = pinch_metric(a, b);
        for _ in 0..10 {
            let again = pinch_metric(a, b);
            assert_eq!(first.distance.to_bits(), again.distance.to_bits());
            assert_eq!(first.midpoint, again.midpoint);
        }
    }

    #[test]
    fn test_in_frame_scales_midpoint_only() {
        let m = pinch_metric(Point2::new(0.5, 0.5), Point2::new(0.5, 0.6));
        let px = m.in_frame(640.0, 480.0);
        assert_eq!(px.distance, m.distance);
        assert!((px.midpoint.x - 320.0).abs() < 1e-9);
        assert!((px.midpoint.y - 264.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_points() {
        let p = Point2::new(0.2, 0.8);
        let m = pinch_metric(p, p);
        assert_eq!(m.distance, 0.0);
        assert_eq!(m.midpoint, p);
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point2::new(0.1, 0.2).is_finite());
        assert!(!Point2::new(f64::NAN, 0.2).is_finite());
        assert!(!Point2::new(0.1, f64::INFINITY).is_finite());
    }
}
