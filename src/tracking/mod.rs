//! Tracking module
//!
//! Hand landmark sources for the gesture tracker:
//! - Frame types and the `FrameSource` seam
//! - MediaPipe hand landmarks (JSON over UDP)
//! - Python tracker subprocess management

pub mod frame;
pub mod mediapipe;
pub mod subprocess;

pub use frame::{DetectedHand, FrameSource, HandFrame, LandmarkPair};
