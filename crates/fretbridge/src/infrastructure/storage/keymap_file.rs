//! TOML key-map configuration.
//!
//! The built-in table covers the default Clone Hero keyboard layout.  Extra
//! or different bindings come from a TOML file so new controls can be added
//! without a rebuild:
//!
//! ```toml
//! # Start from the built-in table (default) or from nothing.
//! replace_defaults = false
//!
//! [bindings]
//! b = 48            # extra fret
//! alt_left = 56     # whammy
//! up = 103          # strum up
//! ```
//!
//! Keys are [`KeyIdentity`] names: a single character, or a named key such
//! as `shift_left`, `up`, `return`.  Values are overlay control codes.
//! Unknown names are rejected rather than silently ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use fretbridge_core::keymap::{ControlCode, KeyIdentity, KeyMap, KeymapError};

/// Error type for key-map file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing key map at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse key map TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The key map could not be serialized to TOML.
    #[error("failed to serialize key map: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A binding names a key the bridge does not know.
    #[error("invalid key {key:?} in [bindings]: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: KeymapError,
    },
}

// ── File schema ───────────────────────────────────────────────────────────────

/// On-disk representation of a key map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KeymapFile {
    /// When `true`, `bindings` is the whole table; otherwise it is layered
    /// over the built-in defaults.
    #[serde(default)]
    pub replace_defaults: bool,
    /// Key identity name → control code.
    #[serde(default)]
    pub bindings: BTreeMap<String, u16>,
}

impl KeymapFile {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolves the bindings into a [`KeyMap`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] for the first unknown key name.
    pub fn into_keymap(self) -> Result<KeyMap, ConfigError> {
        let bindings = self
            .bindings
            .into_iter()
            .map(|(name, code)| {
                let identity: KeyIdentity = name
                    .parse()
                    .map_err(|source| ConfigError::InvalidKey { key: name, source })?;
                Ok((identity, ControlCode(code)))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if !self.replace_defaults {
            return Ok(KeyMap::with_overrides(bindings));
        }
        Ok(bindings
            .into_iter()
            .fold(KeyMap::builder(), |builder, (identity, code)| {
                builder.bind(identity, code)
            })
            .build())
    }
}

impl From<&KeyMap> for KeymapFile {
    /// A self-contained file (`replace_defaults = true`) reproducing `map`.
    fn from(map: &KeyMap) -> Self {
        Self {
            replace_defaults: true,
            bindings: map
                .iter()
                .map(|(identity, code)| (identity.to_string(), code.value()))
                .collect(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the key map for this run.
///
/// With no path the built-in table is used.  A given path must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
/// if the TOML is malformed, and [`ConfigError::InvalidKey`] for unknown keys.
pub fn load_keymap(path: Option<&Path>) -> Result<KeyMap, ConfigError> {
    let Some(path) = path else {
        return Ok(KeyMap::default());
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let keymap = KeymapFile::from_toml(&content)?.into_keymap()?;
    info!("loaded {} key bindings from {}", keymap.len(), path.display());
    Ok(keymap)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
