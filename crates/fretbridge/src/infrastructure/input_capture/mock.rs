//! Mock input source for unit and end-to-end testing.
//!
//! Allows tests to inject synthetic [`RawKeyEvent`]s without installing an
//! OS keyboard hook.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{CaptureError, InputSource, RawKeyEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Clone, Default)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawKeyEvent>>>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic key edge, as if reported by the OS hook.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject(&self, event: RawKeyEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match *guard {
            Some(ref sender) => sender
                .send(event)
                .expect("receiver has been dropped; keep the start() receiver alive"),
            None => panic!("MockInputSource::inject called before start()"),
        }
    }

    /// Injects a down edge followed by an up edge for the same key.
    pub fn tap(&self, identity: impl Into<fretbridge_core::keymap::KeyIdentity> + Copy) {
        self.inject(RawKeyEvent::down(identity));
        self.inject(RawKeyEvent::up(identity));
    }

    /// `true` between `start()` and `stop()`.
    pub fn is_started(&self) -> bool {
        self.sender.lock().expect("lock poisoned").is_some()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender disconnects the channel.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretbridge_core::keymap::{KeyIdentity, NamedKey};
    use fretbridge_core::protocol::TransitionKind;

    #[test]
    fn test_mock_input_source_starts_and_receives_events() {
        // Arrange
        let source = MockInputSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.inject(RawKeyEvent::down('v'));

        // Assert
        let event = rx.recv().expect("should receive event");
        assert_eq!(event.identity, KeyIdentity::Char('v'));
        assert_eq!(event.kind, TransitionKind::Down);
    }

    #[test]
    fn test_mock_input_source_stop_closes_channel() {
        // Arrange
        let source = MockInputSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert – channel should be disconnected
        assert!(rx.recv().is_err(), "channel should be closed after stop()");
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_input_source_rejects_double_start() {
        let source = MockInputSource::new();
        let _rx = source.start().expect("first start");
        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));
    }

    #[test]
    fn test_mock_input_source_tap_sends_down_then_up() {
        let source = MockInputSource::new();
        let rx = source.start().unwrap();

        source.tap(NamedKey::ShiftRight);

        assert_eq!(rx.recv().unwrap(), RawKeyEvent::down(NamedKey::ShiftRight));
        assert_eq!(rx.recv().unwrap(), RawKeyEvent::up(NamedKey::ShiftRight));
    }

    #[test]
    #[should_panic(expected = "before start")]
    fn test_mock_input_source_inject_before_start_panics() {
        MockInputSource::new().inject(RawKeyEvent::down('v'));
    }
}
