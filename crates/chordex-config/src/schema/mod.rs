//! Configuration schema types for Chordex.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod keys;
mod system;

pub use keys::*;
pub use system::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordexConfig {
    pub keys: KeysConfig,
    /// Alias name -> ex string prefix that replaces it.
    pub aliases: BTreeMap<String, String>,
    pub bus: BusConfig,
    pub lock: LockConfig,
    pub rc: RcConfig,
    pub logging: LoggingConfig,
}

impl Default for ChordexConfig {
    fn default() -> Self {
        Self {
            keys: KeysConfig::default(),
            aliases: default_aliases(),
            bus: BusConfig::default(),
            lock: LockConfig::default(),
            rc: RcConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn default_aliases() -> BTreeMap<String, String> {
    [("e", "echo"), ("tf", "tabfocus"), ("rep", "repeat")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
