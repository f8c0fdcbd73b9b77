//! InputProducer: turns raw key edges into key events for the hub.
//!
//! The producer sits between the keyboard hook and the [`BroadcastHub`].
//! [`InputProducer::on_key_transition`] is the whole of its logic: look the
//! key up, drop it if unmapped, otherwise build a [`KeyEvent`] and deliver
//! it.  [`InputProducer::run`] is the thread body that feeds hook events into
//! that entry point until told to stop.
//!
//! Repeated edges (auto-repeat "down" without an "up") are forwarded as-is;
//! the overlay is responsible for any de-duplication.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace};

use fretbridge_core::keymap::{KeyIdentity, KeyMap};
use fretbridge_core::protocol::{KeyEvent, TransitionKind};

use super::hub::BroadcastHub;
use crate::infrastructure::input_capture::RawKeyEvent;

/// How often the producer loop re-checks the shutdown flag when idle.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Maps key edges through a [`KeyMap`] and hands the result to a hub.
#[derive(Debug, Clone)]
pub struct InputProducer {
    keymap: Arc<KeyMap>,
    hub: Arc<BroadcastHub>,
}

impl InputProducer {
    pub fn new(keymap: Arc<KeyMap>, hub: Arc<BroadcastHub>) -> Self {
        Self { keymap, hub }
    }

    /// Handles one key edge reported by the keyboard hook.
    ///
    /// Returns the delivered event, or `None` if `identity` is not mapped
    /// (in which case nothing is sent).
    pub fn on_key_transition(
        &self,
        identity: &KeyIdentity,
        kind: TransitionKind,
    ) -> Option<KeyEvent> {
        let Some(code) = self.keymap.lookup(identity) else {
            trace!("ignoring unmapped key {identity}");
            return None;
        };
        let event = KeyEvent::new(kind.into(), code);
        let delivered = self.hub.deliver(&event);
        debug!("{identity} {kind:?} -> code {code} ({delivered} subscriber(s))");
        Some(event)
    }

    /// Drains `events` until `running` is cleared or the hook channel closes.
    ///
    /// Never tears down the hub; subscribers stay connected after the
    /// producer stops.
    pub fn run(&self, events: Receiver<RawKeyEvent>, running: Arc<AtomicBool>) {
        info!("input producer started ({} mapped keys)", self.keymap.len());
        while running.load(Ordering::Relaxed) {
            match events.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(raw) => {
                    self.on_key_transition(&raw.identity, raw.kind);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("input source closed; producer stopping");
                    return;
                }
            }
        }
        info!("shutdown flag set; producer stopping");
    }

    /// Runs [`InputProducer::run`] on a dedicated `fretbridge-producer` thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(
        self,
        events: Receiver<RawKeyEvent>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("fretbridge-producer".to_string())
            .spawn(move || self.run(events, running))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
