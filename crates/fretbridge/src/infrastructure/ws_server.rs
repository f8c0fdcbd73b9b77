//! WebSocket server: subscriber accept loop and per-subscriber sessions.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured (loopback) address.
//! 2. Accepting incoming TCP connections from overlay pages.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Registering the session with the [`BroadcastHub`].
//! 5. Running two concurrent halves per session:
//!    - **Writer**: drains the session's hub queue into the socket, one
//!      bounded-time send per message.
//!    - **Reader**: discards whatever the page sends and watches for the
//!      connection closing.
//! 6. Unregistering the session when either half finishes.
//! 7. Stopping the accept loop when the `running` flag is cleared.
//!
//! A failed accept or handshake is logged and the loop keeps serving.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{anyhow, Context};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::hub::{BroadcastHub, SubscriberId};
use crate::domain::config::BridgeConfig;

/// How often the accept loop re-checks the shutdown flag when idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that stop the acceptor from starting.
#[derive(Debug, Error)]
pub enum AcceptorError {
    #[error("failed to bind WebSocket listener on {addr}: {source} (is another bridge already running?)")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Per-session timing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound on one WebSocket send.
    pub send_timeout: Duration,
    /// Upper bound on the HTTP upgrade handshake.
    pub handshake_timeout: Duration,
}

impl From<&BridgeConfig> for SessionSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            send_timeout: config.send_timeout,
            handshake_timeout: config.handshake_timeout,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&BridgeConfig::default())
    }
}

/// A bound subscriber endpoint, ready to accept.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Acceptor {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`AcceptorError::Bind`] if the address is in use or cannot be
    /// bound; the bridge cannot run without its endpoint.
    pub async fn bind(addr: SocketAddr) -> Result<Self, AcceptorError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AcceptorError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(AcceptorError::LocalAddr)?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts subscribers until `running` is set to `false`.
    ///
    /// Each connection is handled on its own Tokio task so a slow handshake
    /// never delays the next accept.
    pub async fn run(
        self,
        hub: Arc<BroadcastHub>,
        settings: SessionSettings,
        running: Arc<AtomicBool>,
    ) {
        info!("WebSocket endpoint listening on ws://{}", self.local_addr);

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            // Short timeout so the loop notices the shutdown flag while idle.
            match timeout(ACCEPT_POLL_INTERVAL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    debug!("new connection from {peer_addr}");
                    let hub = Arc::clone(&hub);
                    tokio::spawn(async move {
                        handle_subscriber(stream, peer_addr, hub, settings).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient (e.g. too many open files); keep serving.
                    error!("accept error: {e}");
                }
                Err(_) => {}
            }
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Runs one session and logs how it ended.
async fn handle_subscriber(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: Arc<BroadcastHub>,
    settings: SessionSettings,
) {
    match run_session(stream, peer_addr, &hub, settings).await {
        Ok(()) => info!("subscriber {peer_addr} disconnected"),
        Err(e) => warn!("subscriber {peer_addr} closed with error: {e:#}"),
    }
}

/// Upgrades the connection, registers it, and pumps it until it ends.
///
/// # Errors
///
/// Returns an error if the handshake fails or times out, or if a send fails.
/// The subscriber is unregistered in every case after registration.
async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: &BroadcastHub,
    settings: SessionSettings,
) -> anyhow::Result<()> {
    let ws_stream = timeout(settings.handshake_timeout, accept_async(stream))
        .await
        .map_err(|_| {
            anyhow!(
                "WebSocket handshake with {peer_addr} timed out after {:?}",
                settings.handshake_timeout
            )
        })?
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let id = SubscriberId::from(peer_addr);
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut outbox = hub.register(id);

    // ── Writer: hub queue → socket ────────────────────────────────────────────
    let writer = async {
        while let Some(payload) = outbox.recv().await {
            match timeout(
                settings.send_timeout,
                ws_tx.send(WsMessage::Text(payload.to_string())),
            )
            .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(anyhow!(e).context("WebSocket send failed")),
                Err(_) => {
                    return Err(anyhow!(
                        "WebSocket send stalled for {:?}",
                        settings.send_timeout
                    ))
                }
            }
        }
        // The hub dropped our queue (pruned or replaced).
        debug!("subscriber {peer_addr}: outbound queue closed");
        Ok(())
    };

    // ── Reader: only watches for closure ──────────────────────────────────────
    let reader = async {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(WsMessage::Close(_)) => {
                    debug!("subscriber {peer_addr}: Close frame received");
                    break;
                }
                Ok(other) => {
                    debug!(
                        "subscriber {peer_addr}: ignoring inbound frame ({} bytes)",
                        other.len()
                    );
                }
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                Err(e) => return Err(anyhow!(e).context("WebSocket read failed")),
            }
        }
        Ok(())
    };

    let outcome = tokio::select! {
        result = writer => result,
        result = reader => result,
    };

    hub.unregister(&id);
    // Best effort: tell the page we are going away.
    let _ = timeout(settings.send_timeout, ws_tx.close()).await;
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────
