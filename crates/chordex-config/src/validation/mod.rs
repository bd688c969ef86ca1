//! Full configuration validation.
//!
//! Each check pushes onto a shared error list; all problems are reported
//! together in a single `ConfigError`.

mod helpers;
mod keys;


use crate::schema::ChordexConfig;
use chordex_common::ConfigError;
use helpers::validate_range;

pub fn validate(config: &ChordexConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(&mut errors, "keys.timeout_ms", config.keys.timeout_ms, 1, 60_000);
    validate_range(
        &mut errors,
        "bus.broadcast_timeout_ms",
        config.bus.broadcast_timeout_ms,
        1,
        60_000,
    );
    validate_range(
        &mut errors,
        "lock.poll_interval_ms",
        config.lock.poll_interval_ms,
        1,
        10_000,
    );
    keys::validate_key_maps(&mut errors, config);
    keys::validate_aliases(&mut errors, config);
    validate_log_level(&mut errors, &config.logging.level);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_log_level(errors: &mut Vec<String>, level: &str) {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        errors.push(format!(
            "logging.level = {level:?} must be one of {}",
            LEVELS.join(", ")
        ));
    }
}
