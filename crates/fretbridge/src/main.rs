//! fretbridge entry point.
//!
//! Captures key presses OS-wide (so it works while the game has focus),
//! maps the guitar keys to controller codes, and broadcasts each edge as JSON
//! to every overlay page connected to `ws://127.0.0.1:16899`.
//!
//! # Usage
//!
//! ```text
//! fretbridge [OPTIONS]
//!
//! Options:
//!   --port <PORT>                  WebSocket port [default: 16899]
//!   --bind <ADDR>                  Bind address [default: 127.0.0.1]
//!   --keymap <FILE>                TOML key-map overrides
//!   --queue-capacity <N>           Per-subscriber buffer [default: 64]
//!   --send-timeout-ms <MS>         Per-send limit [default: 1000]
//!   --handshake-timeout-ms <MS>    Upgrade limit [default: 5000]
//!   --log-level <LEVEL>            Used when RUST_LOG is unset [default: info]
//!   --print-keymap                 Print the effective key map as TOML and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Default     | Description                  |
//! |-------------------------|-------------|------------------------------|
//! | `FRETBRIDGE_PORT`       | `16899`     | WebSocket port               |
//! | `FRETBRIDGE_BIND`       | `127.0.0.1` | Bind address                 |
//! | `FRETBRIDGE_KEYMAP`     | unset       | Key-map TOML file            |
//! | `RUST_LOG`              | unset       | `tracing` filter directives  |
//!
//! # Startup failures
//!
//! Two conditions stop the process with a diagnostic: the endpoint cannot be
//! bound (port in use), or no keyboard hook is available.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fretbridge::application::{BroadcastHub, InputProducer};
use fretbridge::domain::config::{BridgeConfig, DEFAULT_PORT};
use fretbridge::infrastructure::input_capture;
use fretbridge::infrastructure::storage::{load_keymap, KeymapFile};
use fretbridge::infrastructure::{Acceptor, SessionSettings};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keyboard-to-overlay bridge for guitar-controller input.
#[derive(Debug, Parser)]
#[command(
    name = "fretbridge",
    about = "Broadcasts guitar-key presses to overlay pages over WebSocket",
    version
)]
struct Cli {
    /// TCP port for the WebSocket endpoint.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "FRETBRIDGE_PORT")]
    port: u16,

    /// IP address to bind the endpoint to.
    ///
    /// Keep the loopback default unless the overlay runs on another machine;
    /// the stream is unauthenticated.
    #[arg(long, default_value = "127.0.0.1", env = "FRETBRIDGE_BIND")]
    bind: String,

    /// TOML file with extra or replacement key bindings.
    #[arg(long, env = "FRETBRIDGE_KEYMAP")]
    keymap: Option<PathBuf>,

    /// Messages buffered per subscriber before it is dropped as stalled.
    #[arg(long, default_value_t = 64)]
    queue_capacity: usize,

    /// Upper bound on one send to one subscriber, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    send_timeout_ms: u64,

    /// Upper bound on the WebSocket handshake, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    handshake_timeout_ms: u64,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the effective key map as TOML and exit.
    #[arg(long)]
    print_keymap: bool,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;
        let ws_bind_addr = SocketAddr::new(ip, self.port);

        Ok(BridgeConfig {
            ws_bind_addr,
            keymap_path: self.keymap,
            queue_capacity: self.queue_capacity,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `RUST_LOG` wins; otherwise fall back to --log-level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str())),
        )
        .init();

    let print_keymap = cli.print_keymap;
    let config = cli.into_bridge_config()?;

    let keymap = load_keymap(config.keymap_path.as_deref()).context("failed to load key map")?;
    if print_keymap {
        print!("{}", KeymapFile::from(&keymap).to_toml()?);
        return Ok(());
    }
    let keymap = Arc::new(keymap);

    info!(
        "fretbridge starting: ws={}, {} mapped keys",
        config.ws_bind_addr,
        keymap.len()
    );

    // ── Startup-fatal resources ───────────────────────────────────────────────
    //
    // Bind first: a second instance should fail on the port before it
    // installs a second keyboard hook.
    let acceptor = Acceptor::bind(config.ws_bind_addr).await?;

    let source = input_capture::default_source()
        .context("cannot capture keyboard input; fretbridge needs a global keyboard hook")?;
    let events = source
        .start()
        .context("cannot capture keyboard input; fretbridge needs a global keyboard hook")?;

    // ── Shared state ──────────────────────────────────────────────────────────
    let hub = Arc::new(BroadcastHub::new(config.queue_capacity));
    let running = Arc::new(AtomicBool::new(true));

    let running_signal = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_signal.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let producer = InputProducer::new(Arc::clone(&keymap), Arc::clone(&hub))
        .spawn(events, Arc::clone(&running))
        .context("failed to start input producer thread")?;

    // ── Serve until shutdown ──────────────────────────────────────────────────
    acceptor
        .run(Arc::clone(&hub), SessionSettings::from(&config), Arc::clone(&running))
        .await;

    source.stop();
    match tokio::task::spawn_blocking(move || producer.join()).await {
        Ok(Ok(())) => {}
        _ => warn!("input producer thread did not exit cleanly"),
    }

    info!("fretbridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
