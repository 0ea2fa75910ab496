//! Gesture module
//!
//! Turns per-frame pinch distances into discrete per-hand interaction modes:
//! - Pinch metric (thumb/index distance + midpoint)
//! - Per-hand state (contact edge detector, tap timers, mode)
//! - Left-hand drag tracking
//! - `GestureTracker`, the aggregate that owns all of the above

pub mod drag;
pub mod hand;
pub mod metric;
pub mod tracker;

pub use drag::DragState;
pub use hand::{HandLabel, HandMode, HandState};
pub use metric::{pinch_metric, PinchMetric, Point2};
pub use tracker::{GestureTracker, HandSample, ModeChange, TransitionCause};
