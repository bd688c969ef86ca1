//! Binding lookup by map name.

use crate::schema::ChordexConfig;

/// Where key bindings come from. Map names are `nmaps`, `imaps`,
/// `inputmaps` and `ignoremaps`.
pub trait ConfigSource {
    /// The ex string bound to `chord` in `map_name`, if any.
    fn get(&self, map_name: &str, chord: &str) -> Option<String>;

    /// Every chord string bound in `map_name`.
    fn chords(&self, map_name: &str) -> Vec<String>;
}

impl ConfigSource for ChordexConfig {
    fn get(&self, map_name: &str, chord: &str) -> Option<String> {
        self.keys.maps.by_name(map_name)?.get(chord).cloned()
    }

    fn chords(&self, map_name: &str) -> Vec<String> {
        self.keys
            .maps
            .by_name(map_name)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}
