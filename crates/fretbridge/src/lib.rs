//! fretbridge library crate.
//!
//! Bridges an OS-wide keyboard hook to WebSocket subscribers so a browser
//! overlay can show guitar-controller input while the game has focus.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! keyboard hook (rdev)          overlay pages (JSON over WebSocket)
//!         │                                   ▲
//!         ▼                                   │
//! [fretbridge]                                │
//!   ├── infrastructure/input_capture  ──►  application/producer
//!   │                                         │ deliver
//!   ├── application/hub  ◄────────────────────┘
//!   │         │ per-subscriber queues
//!   ├── infrastructure/ws_server  ──► sockets
//!   ├── infrastructure/storage        key-map TOML
//!   └── domain/                       BridgeConfig
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `fretbridge-core`; it never opens
//!   a socket or installs a hook.
//! - `infrastructure` depends on everything else plus `tokio`, `tungstenite`,
//!   and `rdev`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: broadcast hub and input producer.
pub mod application;

/// Infrastructure layer: keyboard hook, WebSocket server, config files.
pub mod infrastructure;
