//! OS-wide keyboard hook backed by `rdev`.
//!
//! `rdev::listen` installs the platform hook (low-level keyboard hook on
//! Windows, a CGEventTap on macOS, XRecord on Linux/X11) and blocks its
//! thread forever, invoking the callback for every input event.  It returns
//! only on failure, so `start` gives the hook thread a short grace period and
//! treats an early return as "capability unavailable".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rdev::{listen, Event, EventType, Key};
use tracing::{debug, error, info};

use fretbridge_core::keymap::{KeyIdentity, NamedKey};

use super::{CaptureError, InputSource, RawKeyEvent};

/// How long `start` waits for the hook thread to report an install failure.
const STARTUP_GRACE: Duration = Duration::from_millis(300);

/// Global keyboard hook running on a dedicated `fretbridge-hook` thread.
pub struct RdevInputSource {
    started: AtomicBool,
    /// Cleared by `stop()`; the callback drops events while it is `false`.
    active: Arc<AtomicBool>,
}

impl RdevInputSource {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for RdevInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for RdevInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError> {
        // rdev keeps process-global hook state, so only one listener may exist.
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }

        let (event_tx, event_rx) = mpsc::channel::<RawKeyEvent>();
        let (failure_tx, failure_rx) = mpsc::sync_channel::<String>(1);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        thread::Builder::new()
            .name("fretbridge-hook".to_string())
            .spawn(move || {
                info!("keyboard hook thread started");
                let callback = move |event: Event| {
                    if !active.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(raw) = translate_event(&event.event_type) {
                        // The receiver only disappears at shutdown.
                        let _ = event_tx.send(raw);
                    }
                };
                if let Err(e) = listen(callback) {
                    error!("keyboard hook stopped: {e:?}");
                    let _ = failure_tx.send(format!("{e:?}"));
                }
            })
            .map_err(|e| CaptureError::Unavailable(format!("cannot spawn hook thread: {e}")))?;

        match failure_rx.recv_timeout(STARTUP_GRACE) {
            Ok(reason) => Err(CaptureError::Unavailable(format!(
                "{reason}; on Linux an X11 session (DISPLAY) is required, \
                 on macOS grant Input Monitoring / Accessibility permission"
            ))),
            // Still listening after the grace period (or the thread ended
            // without reporting, which `listen` never does on success).
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                debug!("keyboard hook installed");
                Ok(event_rx)
            }
        }
    }

    fn stop(&self) {
        // rdev offers no way to uninstall the hook; stop forwarding instead.
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Converts an rdev event into a key edge, dropping mouse events and keys
/// the bridge has no identity for.
fn translate_event(event_type: &EventType) -> Option<RawKeyEvent> {
    match event_type {
        EventType::KeyPress(key) => key_identity(*key).map(RawKeyEvent::down),
        EventType::KeyRelease(key) => key_identity(*key).map(RawKeyEvent::up),
        _ => None,
    }
}

/// Maps an rdev physical key to a [`KeyIdentity`].
fn key_identity(key: Key) -> Option<KeyIdentity> {
    let named = |k| Some(KeyIdentity::Named(k));
    let ch = |c| Some(KeyIdentity::Char(c));
    match key {
        Key::ShiftLeft => named(NamedKey::ShiftLeft),
        Key::ShiftRight => named(NamedKey::ShiftRight),
        Key::ControlLeft => named(NamedKey::ControlLeft),
        Key::ControlRight => named(NamedKey::ControlRight),
        Key::Alt => named(NamedKey::AltLeft),
        Key::AltGr => named(NamedKey::AltRight),
        Key::UpArrow => named(NamedKey::Up),
        Key::DownArrow => named(NamedKey::Down),
        Key::LeftArrow => named(NamedKey::Left),
        Key::RightArrow => named(NamedKey::Right),
        Key::Return => named(NamedKey::Return),
        Key::Backspace => named(NamedKey::Backspace),
        Key::Space => named(NamedKey::Space),
        Key::Tab => named(NamedKey::Tab),
        Key::Escape => named(NamedKey::Escape),
        Key::KeyA => ch('a'),
        Key::KeyB => ch('b'),
        Key::KeyC => ch('c'),
        Key::KeyD => ch('d'),
        Key::KeyE => ch('e'),
        Key::KeyF => ch('f'),
        Key::KeyG => ch('g'),
        Key::KeyH => ch('h'),
        Key::KeyI => ch('i'),
        Key::KeyJ => ch('j'),
        Key::KeyK => ch('k'),
        Key::KeyL => ch('l'),
        Key::KeyM => ch('m'),
        Key::KeyN => ch('n'),
        Key::KeyO => ch('o'),
        Key::KeyP => ch('p'),
        Key::KeyQ => ch('q'),
        Key::KeyR => ch('r'),
        Key::KeyS => ch('s'),
        Key::KeyT => ch('t'),
        Key::KeyU => ch('u'),
        Key::KeyV => ch('v'),
        Key::KeyW => ch('w'),
        Key::KeyX => ch('x'),
        Key::KeyY => ch('y'),
        Key::KeyZ => ch('z'),
        Key::Num0 => ch('0'),
        Key::Num1 => ch('1'),
        Key::Num2 => ch('2'),
        Key::Num3 => ch('3'),
        Key::Num4 => ch('4'),
        Key::Num5 => ch('5'),
        Key::Num6 => ch('6'),
        Key::Num7 => ch('7'),
        Key::Num8 => ch('8'),
        Key::Num9 => ch('9'),
        _ => None,
    }
}
