use std::fmt;
use std::str::FromStr;

use chordex_config::schema::{IGNORE_MAP, INPUT_MAP, INSERT_MAP, NORMAL_MAP};
use serde::{Deserialize, Serialize};

/// Interaction mode; each has its own key trie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into an editable element.
    Insert,
    /// Cycling through input fields.
    Input,
    /// Every key passes through except the bindings that leave this mode.
    Ignore,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Normal, Mode::Insert, Mode::Input, Mode::Ignore];

    /// The config map this mode's bindings come from.
    pub fn map_name(self) -> &'static str {
        match self {
            Mode::Normal => NORMAL_MAP,
            Mode::Insert => INSERT_MAP,
            Mode::Input => INPUT_MAP,
            Mode::Ignore => IGNORE_MAP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Insert => "insert",
            Mode::Input => "input",
            Mode::Ignore => "ignore",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("Insert".parse::<Mode>(), Ok(Mode::Insert));
        assert!("visual".parse::<Mode>().is_err());
    }

    #[test]
    fn map_names() {
        assert_eq!(Mode::Normal.map_name(), "nmaps");
        assert_eq!(Mode::Ignore.map_name(), "ignoremaps");
    }
}
