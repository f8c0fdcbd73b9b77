//! Key event types and the JSON message shape sent to overlay subscribers.
//!
//! A [`KeyEvent`] is the normalized form of one key edge: which control
//! changed and in which direction.  It is built by the input producer,
//! encoded once, and discarded.
//!
//! On the wire each event becomes one text frame holding a flat JSON object
//! with exactly two fields:
//!
//! ```json
//! {"event_type":"key_pressed","keycode":47}
//! {"event_type":"key_released","keycode":47}
//! ```
//!
//! The field order is part of the contract: overlay pages in the wild compare
//! raw strings, so `event_type` is always serialized first.

use serde::{Deserialize, Serialize};

use crate::keymap::ControlCode;

/// Direction reported by the raw input-capture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Down,
    Up,
}

/// Normalized key transition carried by a [`KeyEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Pressed,
    Released,
}

impl From<TransitionKind> for Transition {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Down => Transition::Pressed,
            TransitionKind::Up => Transition::Released,
        }
    }
}

/// One key edge on a recognised control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub transition: Transition,
    pub code: ControlCode,
}

impl KeyEvent {
    pub const fn new(transition: Transition, code: ControlCode) -> Self {
        Self { transition, code }
    }

    pub const fn pressed(code: ControlCode) -> Self {
        Self::new(Transition::Pressed, code)
    }

    pub const fn released(code: ControlCode) -> Self {
        Self::new(Transition::Released, code)
    }

    /// Converts the event into its serializable wire shape.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            event_type: self.transition.into(),
            keycode: self.code.value(),
        }
    }
}

/// `event_type` discriminant as it appears in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventType {
    KeyPressed,
    KeyReleased,
}

impl From<Transition> for WireEventType {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Pressed => WireEventType::KeyPressed,
            Transition::Released => WireEventType::KeyReleased,
        }
    }
}

impl From<WireEventType> for Transition {
    fn from(event_type: WireEventType) -> Self {
        match event_type {
            WireEventType::KeyPressed => Transition::Pressed,
            WireEventType::KeyReleased => Transition::Released,
        }
    }
}

/// The JSON object delivered to every subscriber for one [`KeyEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireMessage {
    pub event_type: WireEventType,
    pub keycode: u16,
}

impl From<WireMessage> for KeyEvent {
    fn from(msg: WireMessage) -> Self {
        KeyEvent::new(msg.event_type.into(), ControlCode(msg.keycode))
    }
}
