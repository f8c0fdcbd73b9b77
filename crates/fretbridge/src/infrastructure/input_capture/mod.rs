//! Input capture infrastructure.
//!
//! The OS-wide keyboard hook is an opaque capability: it reports every key
//! edge regardless of which application has focus.  Hook callbacks must
//! return quickly, so each adapter only converts the OS event into a
//! [`RawKeyEvent`] and pushes it into an `mpsc` channel; all mapping and
//! fan-out happens on the producer thread that drains the channel.
//!
//! # Testability
//!
//! The [`InputSource`] trait lets tests inject synthetic events through
//! [`mock::MockInputSource`] without installing a real hook.

use std::sync::mpsc;

use fretbridge_core::keymap::KeyIdentity;
use fretbridge_core::protocol::TransitionKind;

pub mod mock;

#[cfg(feature = "global-hook")]
pub mod rdev_hook;

/// One key edge as reported by the capture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub identity: KeyIdentity,
    pub kind: TransitionKind,
}

impl RawKeyEvent {
    pub fn down(identity: impl Into<KeyIdentity>) -> Self {
        Self {
            identity: identity.into(),
            kind: TransitionKind::Down,
        }
    }

    pub fn up(identity: impl Into<KeyIdentity>) -> Self {
        Self {
            identity: identity.into(),
            kind: TransitionKind::Up,
        }
    }
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The keyboard hook cannot be installed on this system.
    #[error("keyboard hook unavailable: {0}")]
    Unavailable(String),
    /// `start` was called on a source that is already running.
    #[error("capture source already started")]
    AlreadyStarted,
}

/// Trait abstracting the keyboard hook.
///
/// The production implementation uses rdev; tests use [`mock::MockInputSource`].
pub trait InputSource: Send {
    /// Starts capturing and returns a receiver for key edges.
    ///
    /// Returns [`CaptureError::Unavailable`] if the hook cannot be installed.
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError>;
    /// Stops delivering events.
    fn stop(&self);
}

/// Returns the OS keyboard hook compiled into this binary.
#[cfg(feature = "global-hook")]
pub fn default_source() -> Result<Box<dyn InputSource>, CaptureError> {
    Ok(Box::new(rdev_hook::RdevInputSource::new()))
}

/// Returns the OS keyboard hook compiled into this binary.
///
/// This build has none, so this always fails with an operator-facing hint.
#[cfg(not(feature = "global-hook"))]
pub fn default_source() -> Result<Box<dyn InputSource>, CaptureError> {
    Err(CaptureError::Unavailable(
        "this binary was built without a global keyboard hook; \
         rebuild with `cargo build --release --features global-hook`"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretbridge_core::keymap::NamedKey;

    #[test]
    fn test_raw_event_constructors() {
        let down = RawKeyEvent::down('V');
        assert_eq!(down.identity, KeyIdentity::Char('v'));
        assert_eq!(down.kind, TransitionKind::Down);

        let up = RawKeyEvent::up(NamedKey::ShiftLeft);
        assert_eq!(up.identity, KeyIdentity::Named(NamedKey::ShiftLeft));
        assert_eq!(up.kind, TransitionKind::Up);
    }

    #[cfg(not(feature = "global-hook"))]
    #[test]
    fn test_default_source_without_hook_explains_fix() {
        let err = default_source().err().expect("no hook compiled in");
        assert!(matches!(err, CaptureError::Unavailable(_)));
        assert!(err.to_string().contains("--features global-hook"));
    }
}
