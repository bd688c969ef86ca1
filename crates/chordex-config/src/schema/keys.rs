//! Key map configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NORMAL_MAP: &str = "nmaps";
pub const INSERT_MAP: &str = "imaps";
pub const INPUT_MAP: &str = "inputmaps";
pub const IGNORE_MAP: &str = "ignoremaps";

/// Every map name, in mode order.
pub const MAP_NAMES: [&str; 4] = [NORMAL_MAP, INSERT_MAP, INPUT_MAP, IGNORE_MAP];

/// A chord string -> ex string table. An empty ex string unbinds the chord.
pub type KeyMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Idle time (ms) after which a pending key sequence is dropped.
    pub timeout_ms: u64,
    pub maps: KeyMaps,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            maps: KeyMaps::default(),
        }
    }
}

/// Per-mode key maps.
///
/// A mode's table given in the config file replaces that mode's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMaps {
    pub normal: KeyMap,
    pub insert: KeyMap,
    pub input: KeyMap,
    pub ignore: KeyMap,
}

impl KeyMaps {
    /// Look up a map by its `nmaps`-style name.
    pub fn by_name(&self, map_name: &str) -> Option<&KeyMap> {
        match map_name {
            NORMAL_MAP => Some(&self.normal),
            INSERT_MAP => Some(&self.insert),
            INPUT_MAP => Some(&self.input),
            IGNORE_MAP => Some(&self.ignore),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &KeyMap)> {
        MAP_NAMES
            .into_iter()
            .filter_map(move |name| self.by_name(name).map(|map| (name, map)))
    }
}

impl Default for KeyMaps {
    fn default() -> Self {
        Self {
            normal: map(&[
                (".", "repeat"),
                ("gg", "echo top"),
                ("G", "echo bottom"),
                ("<A-1>", "tabfocus 1"),
                ("<A-2>", "tabfocus 2"),
                ("<C-l>", "lock demo"),
                ("<C-u>", "unlock demo"),
                ("i", "mode insert"),
                ("<S-Escape>", "mode ignore"),
            ]),
            insert: map(&[("<Escape>", "mode normal")]),
            input: map(&[("<Escape>", "mode normal"), ("<Tab>", "echo next field")]),
            ignore: map(&[("<S-Escape>", "mode normal")]),
        }
    }
}

fn map(pairs: &[(&str, &str)]) -> KeyMap {
    pairs
        .iter()
        .map(|(chord, exstr)| (chord.to_string(), exstr.to_string()))
        .collect()
}
