//! Storage infrastructure: configuration files read at startup.

pub mod keymap_file;

pub use keymap_file::{load_keymap, ConfigError, KeymapFile};
