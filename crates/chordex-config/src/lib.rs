//! Chordex configuration.
//!
//! TOML-based configuration for key maps, aliases, bus and lock timing,
//! and the startup rc file. Every section uses `serde(default)`, so a
//! partial config (or none at all) works out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chordex_config::{load_config, ConfigSource};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{:?}", config.get("nmaps", "gg"));
//! ```

pub mod aliases;
pub mod rc;
pub mod schema;
pub mod source;
pub mod toml_loader;
pub mod validation;

pub use aliases::expand_exstr;
pub use rc::{load_rc, rc_file_to_ex_cmds};
pub use schema::{ChordexConfig, CONFIG_SCHEMA_VERSION};
pub use source::ConfigSource;

use chordex_common::ConfigError;
use std::path::Path;

/// Load config from `path`, or from the platform default path when `None`.
///
/// An explicit path must exist. The default path is created from the
/// documented template on first run.
pub fn load_config(path: Option<&Path>) -> Result<ChordexConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ChordexConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
