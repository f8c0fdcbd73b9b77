//! Domain layer for fretbridge.
//!
//! Plain configuration types with no I/O.  Key identities, control codes,
//! and wire messages live in `fretbridge-core`; this layer only adds what
//! the running bridge needs on top of them.

pub mod config;

pub use config::BridgeConfig;
