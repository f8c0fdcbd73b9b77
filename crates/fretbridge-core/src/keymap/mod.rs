//! Key mapping table: physical key identity to overlay control code.
//!
//! The overlay identifies each guitar control by an integer code.  The codes
//! are Linux evdev scan codes (`KEY_V` = 47, `KEY_RIGHTSHIFT` = 54, ...),
//! which is what the overlay page already listens for, so a keyboard-driven
//! session and a real controller session look identical to it.
//!
//! # Default table
//!
//! | Key            | Control      | Code |
//! |----------------|--------------|------|
//! | `v`            | green fret   | 47   |
//! | `c`            | red fret     | 46   |
//! | `x`            | yellow fret  | 45   |
//! | `z`            | blue fret    | 44   |
//! | `shift_left`   | orange fret  | 54   |
//! | `shift_right`  | orange fret  | 54   |
//! | `up`           | strum up     | 103  |
//! | `down`         | strum down   | 108  |
//! | `alt_left`     | whammy       | 56   |
//! | `return`       | start        | 28   |
//! | `backspace`    | select       | 14   |
//!
//! Both Shift keys deliberately map to the same orange code; the overlay does
//! not distinguish which physical variant was pressed.

pub mod identity;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

pub use identity::{KeyIdentity, KeymapError, NamedKey};

/// Integer identifying a logical controller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlCode(pub u16);

impl ControlCode {
    pub const GREEN: ControlCode = ControlCode(47);
    pub const RED: ControlCode = ControlCode(46);
    pub const YELLOW: ControlCode = ControlCode(45);
    pub const BLUE: ControlCode = ControlCode(44);
    pub const ORANGE: ControlCode = ControlCode(54);
    pub const STRUM_UP: ControlCode = ControlCode(103);
    pub const STRUM_DOWN: ControlCode = ControlCode(108);
    pub const WHAMMY: ControlCode = ControlCode(56);
    pub const START: ControlCode = ControlCode(28);
    pub const SELECT: ControlCode = ControlCode(14);

    /// Returns the raw numeric code.
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl From<u16> for ControlCode {
    fn from(value: u16) -> Self {
        ControlCode(value)
    }
}

impl fmt::Display for ControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable lookup table from [`KeyIdentity`] to [`ControlCode`].
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: HashMap<KeyIdentity, ControlCode>,
}

impl KeyMap {
    /// Starts an empty table.
    pub fn builder() -> KeyMapBuilder {
        KeyMapBuilder::default()
    }

    /// Returns the control code bound to `key`, or `None` if the key is not
    /// part of the control set.  Character keys match case-insensitively.
    pub fn lookup(&self, key: &KeyIdentity) -> Option<ControlCode> {
        self.bindings.get(&key.normalized()).copied()
    }

    /// Returns the default table with `overrides` layered on top.
    ///
    /// An override for an already-bound key replaces its code; an override
    /// for a new key adds a binding.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (KeyIdentity, ControlCode)>,
    {
        let mut builder = KeyMapBuilder::from(KeyMap::default());
        for (key, code) in overrides {
            builder = builder.bind(key, code);
        }
        builder.build()
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates the bindings, sorted by key for stable output.
    pub fn iter(&self) -> impl Iterator<Item = (KeyIdentity, ControlCode)> {
        let mut entries: Vec<_> = self.bindings.iter().map(|(k, c)| (*k, *c)).collect();
        entries.sort();
        entries.into_iter()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap::builder()
            .bind(KeyIdentity::Char('v'), ControlCode::GREEN)
            .bind(KeyIdentity::Char('c'), ControlCode::RED)
            .bind(KeyIdentity::Char('x'), ControlCode::YELLOW)
            .bind(KeyIdentity::Char('z'), ControlCode::BLUE)
            .bind(NamedKey::ShiftLeft, ControlCode::ORANGE)
            .bind(NamedKey::ShiftRight, ControlCode::ORANGE)
            .bind(NamedKey::Up, ControlCode::STRUM_UP)
            .bind(NamedKey::Down, ControlCode::STRUM_DOWN)
            .bind(NamedKey::AltLeft, ControlCode::WHAMMY)
            .bind(NamedKey::Return, ControlCode::START)
            .bind(NamedKey::Backspace, ControlCode::SELECT)
            .build()
    }
}

/// Incrementally assembles a [`KeyMap`].
#[derive(Debug, Default)]
pub struct KeyMapBuilder {
    bindings: HashMap<KeyIdentity, ControlCode>,
}

impl KeyMapBuilder {
    /// Binds `key` to `code`, replacing any previous binding for `key`.
    pub fn bind(mut self, key: impl Into<KeyIdentity>, code: ControlCode) -> Self {
        let key: KeyIdentity = key.into();
        let key = key.normalized();
        if let Some(previous) = self.bindings.insert(key, code) {
            if previous != code {
                debug!("rebinding {key}: {previous} -> {code}");
            }
        }
        self
    }

    pub fn build(self) -> KeyMap {
        KeyMap {
            bindings: self.bindings,
        }
    }
}

impl From<KeyMap> for KeyMapBuilder {
    fn from(map: KeyMap) -> Self {
        Self {
            bindings: map.bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frets_map_to_evdev_codes() {
        let map = KeyMap::default();
        assert_eq!(map.lookup(&KeyIdentity::Char('v')), Some(ControlCode(47)));
        assert_eq!(map.lookup(&KeyIdentity::Char('c')), Some(ControlCode(46)));
        assert_eq!(map.lookup(&KeyIdentity::Char('x')), Some(ControlCode(45)));
        assert_eq!(map.lookup(&KeyIdentity::Char('z')), Some(ControlCode(44)));
    }

    #[test]
    fn test_both_shift_variants_share_orange() {
        let map = KeyMap::default();
        let left = map.lookup(&NamedKey::ShiftLeft.into());
        let right = map.lookup(&NamedKey::ShiftRight.into());
        assert_eq!(left, Some(ControlCode(54)));
        assert_eq!(left, right);
    }

    #[test]
    fn test_default_auxiliary_controls() {
        let map = KeyMap::default();
        assert_eq!(map.lookup(&NamedKey::Up.into()), Some(ControlCode::STRUM_UP));
        assert_eq!(map.lookup(&NamedKey::Down.into()), Some(ControlCode::STRUM_DOWN));
        assert_eq!(map.lookup(&NamedKey::AltLeft.into()), Some(ControlCode::WHAMMY));
        assert_eq!(map.lookup(&NamedKey::Return.into()), Some(ControlCode::START));
        assert_eq!(map.lookup(&NamedKey::Backspace.into()), Some(ControlCode::SELECT));
        assert_eq!(map.len(), 11);
    }

    #[test]
    fn test_unmapped_key_returns_none() {
        let map = KeyMap::default();
        assert_eq!(map.lookup(&KeyIdentity::Char('q')), None);
        assert_eq!(map.lookup(&NamedKey::Escape.into()), None);
    }

    #[test]
    fn test_lookup_is_stable() {
        let map = KeyMap::default();
        let key = KeyIdentity::Char('v');
        assert_eq!(map.lookup(&key), map.lookup(&key));
    }

    #[test]
    fn test_with_overrides_replaces_and_adds() {
        // Arrange
        let overrides = [
            (KeyIdentity::Char('v'), ControlCode(2)),
            (KeyIdentity::Char('b'), ControlCode(48)),
        ];

        // Act
        let map = KeyMap::with_overrides(overrides);

        // Assert
        assert_eq!(map.lookup(&KeyIdentity::Char('v')), Some(ControlCode(2)));
        assert_eq!(map.lookup(&KeyIdentity::Char('b')), Some(ControlCode(48)));
        assert_eq!(map.lookup(&KeyIdentity::Char('c')), Some(ControlCode::RED));
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn test_literal_uppercase_char_still_matches() {
        // Arrange
        let map = KeyMap::builder()
            .bind(KeyIdentity::Char('B'), ControlCode(48))
            .build();

        // Act / Assert
        assert_eq!(
            KeyMap::default().lookup(&KeyIdentity::Char('V')),
            Some(ControlCode::GREEN)
        );
        assert_eq!(map.lookup(&KeyIdentity::Char('b')), Some(ControlCode(48)));
        assert_eq!(map.lookup(&KeyIdentity::Char('B')), Some(ControlCode(48)));
    }

    #[test]
    fn test_builder_starts_empty() {
        let map = KeyMap::builder().build();
        assert!(map.is_empty());
        assert_eq!(map.lookup(&KeyIdentity::Char('v')), None);
    }

    #[test]
    fn test_iter_is_sorted_and_complete() {
        let map = KeyMap::default();
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries.len(), map.len());
        assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
