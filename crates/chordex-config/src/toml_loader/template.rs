//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> String {
    r##"# Chordex Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[keys]
# timeout_ms = 1000      # idle time before a pending chord is dropped

# One table per mode: normal, insert, input, ignore.
# A table given here replaces that mode's built-in bindings.
# Chords: plain keys ("gg", "g g") and bracket expressions ("<C-x>", "<A-S-Enter>").
# An empty ex string unbinds a chord.
#
# [keys.maps.normal]
# "." = "repeat"
# "gg" = "echo top"
# "<C-l>" = "lock demo"

# A table given here replaces the built-in aliases.
# [aliases]
# e = "echo"
# tf = "tabfocus"
# rep = "repeat"

[bus]
# broadcast_timeout_ms = 2000

[lock]
# poll_interval_ms = 100

[rc]
# path = "/path/to/chordexrc"   # one ex string per line, lines starting with " are comments

[logging]
# level = "info"         # trace, debug, info, warn, error
"##
    .to_string()
}
