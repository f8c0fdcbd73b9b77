//! Infrastructure layer for fretbridge.
//!
//! Everything that touches the OS: the keyboard hook, the WebSocket
//! listener, and the key-map file on disk.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain`,
//! and `fretbridge_core`, but `application` only reaches back for the
//! [`input_capture::RawKeyEvent`] value type.

pub mod input_capture;
pub mod storage;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use ws_server::{Acceptor, AcceptorError, SessionSettings};
