//! # fretbridge-core
//!
//! Shared, I/O-free building blocks for fretbridge: the physical key
//! identities reported by input capture, the table that maps them to overlay
//! control codes, and the JSON messages broadcast to overlay subscribers.
//!
//! # Architecture overview
//!
//! fretbridge turns keyboard presses into "guitar controller" events for a
//! browser overlay.  A global keyboard hook reports raw key edges; each edge
//! on a recognised key becomes a [`KeyEvent`] and is fanned out as JSON to
//! every connected WebSocket subscriber.
//!
//! - **`keymap`** – [`KeyIdentity`] (which physical key) and [`KeyMap`]
//!   (which control code it drives).
//! - **`protocol`** – [`KeyEvent`] and its wire encoding.
//!
//! Nothing here touches sockets, threads, or OS hooks; that lives in the
//! `fretbridge` crate.

pub mod keymap;
pub mod protocol;

pub use keymap::{ControlCode, KeyIdentity, KeyMap, KeyMapBuilder, KeymapError, NamedKey};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{KeyEvent, Transition, TransitionKind, WireEventType, WireMessage};
