//! Application layer for fretbridge.
//!
//! Knows *what* happens to a key edge (map it, fan it out) but not *how*
//! bytes reach the network.
//!
//! # Responsibilities
//!
//! - [`hub::BroadcastHub`]: the subscriber set and the single delivery path
//! - [`producer::InputProducer`]: key edge → key event → hub
//!
//! # What does NOT belong here?
//!
//! - Listening sockets and WebSocket framing (infrastructure)
//! - Installing OS keyboard hooks (infrastructure)

pub mod hub;
pub mod producer;

pub use hub::{BroadcastHub, Payload, SubscriberId};
pub use producer::InputProducer;
