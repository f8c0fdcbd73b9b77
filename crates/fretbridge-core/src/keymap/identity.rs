//! Physical key identities.
//!
//! A [`KeyIdentity`] names the physical key that produced a transition,
//! independent of whichever capture backend observed it.  Character keys are
//! stored lowercased so that `V` (Shift held) and `v` resolve to the same
//! control.
//!
//! Every identity has a stable textual form used in key-map configuration
//! files:
//!
//! | Identity                         | Text           |
//! |----------------------------------|----------------|
//! | `KeyIdentity::Char('v')`         | `v`            |
//! | `KeyIdentity::Named(ShiftLeft)`  | `shift_left`   |
//! | `KeyIdentity::Named(Up)`         | `up`           |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a textual key identity cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeymapError {
    #[error("empty key identity")]
    Empty,
    #[error("unknown key identity: {0:?}")]
    UnknownKey(String),
}

/// Non-character keys the bridge can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    Up,
    Down,
    Left,
    Right,
    Return,
    Backspace,
    Space,
    Tab,
    Escape,
}

impl NamedKey {
    /// All named keys, in declaration order.
    pub const ALL: [NamedKey; 15] = [
        NamedKey::ShiftLeft,
        NamedKey::ShiftRight,
        NamedKey::ControlLeft,
        NamedKey::ControlRight,
        NamedKey::AltLeft,
        NamedKey::AltRight,
        NamedKey::Up,
        NamedKey::Down,
        NamedKey::Left,
        NamedKey::Right,
        NamedKey::Return,
        NamedKey::Backspace,
        NamedKey::Space,
        NamedKey::Tab,
        NamedKey::Escape,
    ];

    /// Configuration name of this key (`snake_case`).
    pub fn as_str(self) -> &'static str {
        match self {
            NamedKey::ShiftLeft => "shift_left",
            NamedKey::ShiftRight => "shift_right",
            NamedKey::ControlLeft => "control_left",
            NamedKey::ControlRight => "control_right",
            NamedKey::AltLeft => "alt_left",
            NamedKey::AltRight => "alt_right",
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::Return => "return",
            NamedKey::Backspace => "backspace",
            NamedKey::Space => "space",
            NamedKey::Tab => "tab",
            NamedKey::Escape => "escape",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        // A few aliases are accepted so hand-written config files read naturally.
        let canonical = match name {
            "enter" => "return",
            "esc" => "escape",
            "alt" => "alt_left",
            "ctrl_left" => "control_left",
            "ctrl_right" => "control_right",
            other => other,
        };
        Self::ALL.into_iter().find(|k| k.as_str() == canonical)
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The physical key a raw transition was reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyIdentity {
    /// A key that produces a printable character.
    ///
    /// Prefer [`KeyIdentity::char`], which folds to lowercase.  A literal
    /// `Char('V')` is still accepted: [`KeyMap`](super::KeyMap) folds
    /// identities on both bind and lookup.
    Char(char),
    /// A modifier, arrow, or other non-character key.
    Named(NamedKey),
}

impl KeyIdentity {
    /// Builds a character identity, folding the character to lowercase.
    ///
    /// Characters whose lowercase form is more than one code point are kept
    /// as-is.
    pub fn char(c: char) -> Self {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => KeyIdentity::Char(l),
            _ => KeyIdentity::Char(c),
        }
    }

    /// Returns the canonical form of this identity (character keys folded to
    /// lowercase, named keys unchanged).
    pub fn normalized(self) -> Self {
        match self {
            KeyIdentity::Char(c) => KeyIdentity::char(c),
            named => named,
        }
    }

    /// Builds a named-key identity.
    pub const fn named(key: NamedKey) -> Self {
        KeyIdentity::Named(key)
    }
}

impl From<NamedKey> for KeyIdentity {
    fn from(key: NamedKey) -> Self {
        KeyIdentity::Named(key)
    }
}

impl From<char> for KeyIdentity {
    fn from(c: char) -> Self {
        KeyIdentity::char(c)
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyIdentity::Char(c) => write!(f, "{c}"),
            KeyIdentity::Named(k) => k.fmt(f),
        }
    }
}

impl FromStr for KeyIdentity {
    type Err = KeymapError;

    /// Parses a configuration key name.
    ///
    /// A single character is a character key; anything longer must be a
    /// [`NamedKey`] name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(KeymapError::Empty),
            (Some(c), None) => Ok(KeyIdentity::char(c)),
            _ => NamedKey::from_name(&trimmed.to_ascii_lowercase())
                .map(KeyIdentity::Named)
                .ok_or_else(|| KeymapError::UnknownKey(trimmed.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_identity_is_lowercased() {
        assert_eq!(KeyIdentity::char('V'), KeyIdentity::Char('v'));
        assert_eq!(KeyIdentity::from('Z'), KeyIdentity::Char('z'));
    }

    #[test]
    fn test_normalized_folds_literal_uppercase_char() {
        assert_eq!(KeyIdentity::Char('V').normalized(), KeyIdentity::Char('v'));
        assert_eq!(
            KeyIdentity::Named(NamedKey::Up).normalized(),
            KeyIdentity::Named(NamedKey::Up)
        );
    }

    #[test]
    fn test_parse_single_character() {
        let id: KeyIdentity = "c".parse().unwrap();
        assert_eq!(id, KeyIdentity::Char('c'));
    }

    #[test]
    fn test_parse_uppercase_single_character_folds() {
        let id: KeyIdentity = "X".parse().unwrap();
        assert_eq!(id, KeyIdentity::Char('x'));
    }

    #[test]
    fn test_parse_named_key() {
        let id: KeyIdentity = "shift_right".parse().unwrap();
        assert_eq!(id, KeyIdentity::Named(NamedKey::ShiftRight));
    }

    #[test]
    fn test_parse_named_key_is_case_insensitive() {
        let id: KeyIdentity = "Up".parse().unwrap();
        assert_eq!(id, KeyIdentity::Named(NamedKey::Up));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            "enter".parse::<KeyIdentity>().unwrap(),
            KeyIdentity::Named(NamedKey::Return)
        );
        assert_eq!(
            "alt".parse::<KeyIdentity>().unwrap(),
            KeyIdentity::Named(NamedKey::AltLeft)
        );
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert_eq!("  ".parse::<KeyIdentity>(), Err(KeymapError::Empty));
    }

    #[test]
    fn test_parse_unknown_name_is_error() {
        let err = "f13".parse::<KeyIdentity>().unwrap_err();
        assert_eq!(err, KeymapError::UnknownKey("f13".to_string()));
    }

    #[test]
    fn test_display_round_trips_every_named_key() {
        for key in NamedKey::ALL {
            let text = KeyIdentity::Named(key).to_string();
            assert_eq!(text.parse::<KeyIdentity>().unwrap(), KeyIdentity::Named(key));
        }
    }
}
