//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! `main.rs` populates it from CLI arguments and environment variables; tests
//! build it directly or start from [`BridgeConfig::default`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Port the overlay page connects to (`ws://127.0.0.1:16899`).
pub const DEFAULT_PORT: u16 = 16899;

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use fretbridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 16899);
/// assert!(cfg.ws_bind_addr.ip().is_loopback());
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the WebSocket endpoint binds to.
    ///
    /// Loopback by default: the overlay runs in a browser source on the same
    /// machine, and nothing here is authenticated.
    pub ws_bind_addr: SocketAddr,

    /// Optional TOML file with key-map overrides.
    pub keymap_path: Option<PathBuf>,

    /// Outbound messages buffered per subscriber before it is considered
    /// stalled and pruned.
    pub queue_capacity: usize,

    /// Upper bound on a single WebSocket send to one subscriber.
    pub send_timeout: Duration,

    /// Upper bound on the WebSocket upgrade handshake.
    pub handshake_timeout: Duration,
}

impl Default for BridgeConfig {
    /// | Field             | Default             |
    /// |-------------------|---------------------|
    /// | ws_bind_addr      | `127.0.0.1:16899`   |
    /// | keymap_path       | none                |
    /// | queue_capacity    | 64                  |
    /// | send_timeout      | 1 second            |
    /// | handshake_timeout | 5 seconds           |
    fn default() -> Self {
        Self {
            ws_bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            keymap_path: None,
            queue_capacity: 64,
            send_timeout: Duration::from_secs(1),
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
