//! MediaPipe hand landmark receiver
//!
//! Receives JSON-over-UDP packets from the `scripts/hand_tracker.py` Python
//! helper, one datagram per camera frame:
//!
//! ```json
//! {"timestamp": 812.034, "hands": [{"label": "Left", "thumb_tip": [0.41, 0.52], "index_tip": [0.43, 0.49]}]}
//! ```
//!
//! `timestamp` is the tracker's monotonic clock at capture. Packets without
//! one are timed on arrival.

use serde::Deserialize;
use std::collections::HashSet;
use std::net::{SocketAddr, UdpSocket};

use crate::config::TrackingConfig;
use crate::error::{PinchwireError, TrackingError};
use crate::gesture::{HandLabel, Point2};
use crate::tracking::frame::{DetectedHand, FrameSource, HandFrame, LandmarkPair};

/// A single JSON packet from the hand tracker
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandPacket {
    /// Capture time in seconds, tracker clock
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// Detected hands this frame; empty when none are visible
    #[serde(default)]
    pub hands: Vec<HandEntry>,
}

/// One hand as reported by MediaPipe
#[derive(Debug, Clone, Deserialize)]
pub struct HandEntry {
    /// Handedness label, "Left" or "Right"
    pub label: String,
    /// Landmark 4, normalized [x, y]
    #[serde(default)]
    pub thumb_tip: Option<[f64; 2]>,
    /// Landmark 8, normalized [x, y]
    #[serde(default)]
    pub index_tip: Option<[f64; 2]>,
}

impl HandEntry {
    /// Convert to a detected hand. Unknown labels, missing tips and
    /// non-finite coordinates all count as "not detected".
    fn to_detected(&self, mirror_labels: bool) -> Option<DetectedHand> {
        let label: HandLabel = self.label.parse().ok()?;
        let label = if mirror_labels { label.mirrored() } else { label };

        let thumb = Point2::from(self.thumb_tip?);
        let index = Point2::from(self.index_tip?);
        if !thumb.is_finite() || !index.is_finite() {
            return None;
        }

        Some(DetectedHand {
            label,
            landmarks: LandmarkPair { thumb, index },
        })
    }
}

impl HandPacket {
    /// Build a frame, keeping the first entry for each label
    pub fn into_frame(self, mirror_labels: bool) -> HandFrame {
        let mut seen = HashSet::new();
        let hands = self
            .hands
            .iter()
            .filter_map(|entry| {
                let hand = entry.to_detected(mirror_labels);
                if hand.is_none() {
                    tracing::debug!("Dropping malformed hand entry: {:?}", entry);
                }
                hand
            })
            .filter(|hand| seen.insert(hand.label))
            .collect();

        let frame = HandFrame::new(hands);
        match self.timestamp {
            Some(t) => frame.with_capture_time(t),
            None => frame,
        }
    }
}

/// Hand landmark JSON-over-UDP receiver
pub struct HandReceiver {
    config: TrackingConfig,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
}

impl HandReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            config: config.clone(),
            socket: None,
            buf: vec![0u8; 65536],
        }
    }

    /// Bind the UDP socket and start receiving
    pub fn start(&mut self) -> Result<(), PinchwireError> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).map_err(|e| {
            TrackingError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            TrackingError::Receiver(format!("Failed to set non-blocking: {}", e))
        })?;

        tracing::info!("Hand landmark receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    /// Address the socket is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Receive and decode one pending datagram (non-blocking)
    pub fn process(&mut self) -> Result<Option<HandFrame>, PinchwireError> {
        let socket = match &self.socket {
            Some(s) => s,
            None => return Ok(None),
        };

        match socket.recv(&mut self.buf) {
            Ok(size) if size > 0 => {
                let packet: HandPacket = serde_json::from_slice(&self.buf[..size]).map_err(|e| {
                    TrackingError::Parse(format!("JSON parse error: {}", e))
                })?;
                Ok(Some(packet.into_frame(self.config.mirror_labels)))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // No data available
                Ok(None)
            }
            Err(e) => Err(TrackingError::Receiver(format!("Receive error: {}", e)).into()),
        }
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Hand landmark receiver stopped");
    }
}

impl FrameSource for HandReceiver {
    fn next_frame(&mut self) -> Result<Option<HandFrame>, PinchwireError> {
        self.process()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(json: &str) -> HandPacket {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_packet() {
        let pkt = parse(
            r#"{"hands":[
                {"label":"Left","thumb_tip":[0.41,0.52],"index_tip":[0.43,0.49]},
                {"label":"Right","thumb_tip":[0.7,0.5],"index_tip":[0.72,0.5]}
            ]}"#,
        );
        let frame = pkt.into_frame(false);
        assert_eq!(frame.hands.len(), 2);

        let left = frame.hand(HandLabel::Left).unwrap();
        assert_eq!(left.landmarks.thumb, Point2::new(0.41, 0.52));
        assert_eq!(left.landmarks.index, Point2::new(0.43, 0.49));
    }

    #[test]
    fn test_parse_no_hands() {
        assert!(parse(r#"{"hands":[]}"#).into_frame(false).is_empty());
        assert!(parse("{}").into_frame(false).is_empty());
    }

    #[test]
    fn test_malformed_entries_dropped() {
        let pkt = parse(
            r#"{"hands":[
                {"label":"Left","thumb_tip":[0.41,0.52]},
                {"label":"Both","thumb_tip":[0.1,0.1],"index_tip":[0.2,0.2]},
                {"label":"Right","thumb_tip":[0.7,0.5],"index_tip":[0.72,0.5]}
            ]}"#,
        );
        let frame = pkt.into_frame(false);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].label, HandLabel::Right);
    }

    #[test]
    fn test_non_finite_dropped() {
        let pkt = HandPacket {
            timestamp: None,
            hands: vec![HandEntry {
                label: "Left".to_string(),
                thumb_tip: Some([f64::NAN, 0.5]),
                index_tip: Some([0.5, 0.5]),
            }],
        };
        assert!(pkt.into_frame(false).is_empty());
    }

    #[test]
    fn test_duplicate_label_keeps_first() {
        let pkt = parse(
            r#"{"hands":[
                {"label":"Left","thumb_tip":[0.1,0.1],"index_tip":[0.2,0.2]},
                {"label":"Left","thumb_tip":[0.8,0.8],"index_tip":[0.9,0.9]}
            ]}"#,
        );
        let frame = pkt.into_frame(false);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].landmarks.thumb, Point2::new(0.1, 0.1));
    }

    #[test]
    fn test_capture_timestamp() {
        let frame = parse(r#"{"timestamp":812.5,"hands":[]}"#).into_frame(false);
        assert_eq!(frame.captured_at, Some(812.5));
        assert!(frame.is_empty());

        assert_eq!(parse(r#"{"hands":[]}"#).into_frame(false).captured_at, None);
    }

    #[test]
    fn test_mirror_labels() {
        let pkt = parse(r#"{"hands":[{"label":"Right","thumb_tip":[0.1,0.1],"index_tip":[0.2,0.2]}]}"#);
        let frame = pkt.into_frame(true);
        assert_eq!(frame.hands[0].label, HandLabel::Left);
    }

    #[test]
    fn test_process_without_start() {
        let mut receiver = HandReceiver::new(&TrackingConfig::default());
        assert!(receiver.process().unwrap().is_none());
    }

    fn started_receiver() -> HandReceiver {
        let config = TrackingConfig {
            port: 0,
            ..TrackingConfig::default()
        };
        let mut receiver = HandReceiver::new(&config);
        receiver.start().unwrap();
        receiver
    }

    fn poll(receiver: &mut HandReceiver) -> Result<Option<HandFrame>, PinchwireError> {
        for _ in 0..100 {
            match receiver.process() {
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                other => return other,
            }
        }
        Ok(None)
    }

    #[test]
    fn test_receive_datagram() {
        let mut receiver = started_receiver();
        assert!(receiver.process().unwrap().is_none());

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(
                br#"{"hands":[{"label":"Left","thumb_tip":[0.5,0.5],"index_tip":[0.52,0.5]}]}"#,
                receiver.local_addr().unwrap(),
            )
            .unwrap();

        let frame = poll(&mut receiver).unwrap().unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].label, HandLabel::Left);
    }

    #[test]
    fn test_receive_garbage_is_error() {
        let mut receiver = started_receiver();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(b"not json", receiver.local_addr().unwrap())
            .unwrap();

        let err = poll(&mut receiver).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
