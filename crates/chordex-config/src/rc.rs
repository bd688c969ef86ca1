//! rc files: newline-delimited ex strings run at startup.

use chordex_common::ConfigError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Split rc file text into ex strings.
///
/// Blank lines and lines whose first non-blank character is `"` are dropped.
/// Kept lines are returned untrimmed, in file order.
pub fn rc_file_to_ex_cmds(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('"')
        })
        .map(str::to_string)
        .collect()
}

/// Read and split an rc file.
pub fn load_rc(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;
    let cmds = rc_file_to_ex_cmds(&text);
    debug!(path = %path.display(), count = cmds.len(), "loaded rc file");
    Ok(cmds)
}

/// `chordexrc` in the chordex config directory.
pub fn default_rc_path() -> Result<PathBuf, ConfigError> {
    Ok(crate::toml_loader::config_dir()?.join("chordexrc"))
}
