//! Key map and alias validation.

use crate::aliases::expand_exstr;
use crate::schema::ChordexConfig;

/// Chord strings must contain at least one key.
pub(crate) fn validate_key_maps(errors: &mut Vec<String>, config: &ChordexConfig) {
    for (map_name, map) in config.keys.maps.iter() {
        for chord in map.keys() {
            if chord.trim().is_empty() {
                errors.push(format!("{map_name}: empty chord string {chord:?}"));
            }
        }
    }
}

/// Every alias must expand without looping.
pub(crate) fn validate_aliases(errors: &mut Vec<String>, config: &ChordexConfig) {
    for name in config.aliases.keys() {
        if let Err(e) = expand_exstr(name, &config.aliases) {
            errors.push(format!("aliases.{name}: {e}"));
        }
    }
}
