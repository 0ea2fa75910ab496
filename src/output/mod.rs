//! Output module
//!
//! Delivers gesture events to the external consumer:
//! - Line protocol (mode literals, drag updates)
//! - Bounded, non-blocking TCP control channel

pub mod channel;
pub mod event;

pub use channel::ChannelSender;
pub use event::OutboundMessage;
