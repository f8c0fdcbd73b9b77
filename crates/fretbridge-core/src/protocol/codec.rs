//! JSON codec for overlay wire messages.
//!
//! Wire format (one WebSocket text frame per event):
//! ```text
//! {"event_type":"key_pressed"|"key_released","keycode":<u16>}
//! ```

use thiserror::Error;

use crate::protocol::messages::{KeyEvent, WireMessage};

/// Errors that can occur while encoding or decoding a wire message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The event could not be serialized.
    #[error("failed to encode key event: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text is not a valid wire message.
    #[error("malformed wire message: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Encodes a [`KeyEvent`] into the UTF-8 text sent to subscribers.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use fretbridge_core::keymap::ControlCode;
/// use fretbridge_core::protocol::{encode_message, KeyEvent};
///
/// let text = encode_message(&KeyEvent::pressed(ControlCode::GREEN)).unwrap();
/// assert_eq!(text, r#"{"event_type":"key_pressed","keycode":47}"#);
/// ```
pub fn encode_message(event: &KeyEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(&event.to_wire()).map_err(ProtocolError::Encode)
}

/// Decodes subscriber-side text back into a [`KeyEvent`].
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the text is not exactly a wire
/// message.
pub fn decode_message(text: &str) -> Result<KeyEvent, ProtocolError> {
    serde_json::from_str::<WireMessage>(text)
        .map(KeyEvent::from)
        .map_err(ProtocolError::Malformed)
}
