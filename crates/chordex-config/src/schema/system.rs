//! Bus, lock, rc-file, and logging settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Per-target wait (ms) before a broadcast gives up on a realm.
    pub broadcast_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broadcast_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Sleep (ms) between contention probes.
    pub poll_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Startup rc file. When unset, `chordexrc` next to `config.toml` is used
/// if it exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `--log-level` nor `RUST_LOG` is set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}
