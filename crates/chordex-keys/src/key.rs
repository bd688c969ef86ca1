use std::fmt;

use chordex_parser::Modifiers;
use serde::{Deserialize, Serialize};

pub(crate) const MOD_ALT: u8 = 0b0001;
pub(crate) const MOD_CTRL: u8 = 0b0010;
pub(crate) const MOD_META: u8 = 0b0100;
pub(crate) const MOD_SHIFT: u8 = 0b1000;

/// Display letters, in the order modifiers are rendered.
const MOD_LETTERS: [(u8, char); 4] = [
    (MOD_ALT, 'A'),
    (MOD_CTRL, 'C'),
    (MOD_META, 'M'),
    (MOD_SHIFT, 'S'),
];

/// One canonical key press.
///
/// Two events are equal exactly when they denote the same press, so a
/// `KeyEvent` can key a trie edge directly.
///
/// Shift is dropped for printable single-character keys: the character
/// already says whether shift was held (`G` vs `g`). Space keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Bitmask: Alt=1, Ctrl=2, Meta=4, Shift=8.
    pub mods: u8,
    /// Normalized key name (e.g. "g", "Enter", "F1", " ").
    pub key: String,
}

impl KeyEvent {
    /// Build from a key name and parsed modifiers.
    pub fn new(key: &str, modifiers: Modifiers) -> Self {
        Self::from_raw(modifiers.alt, modifiers.ctrl, modifiers.meta, modifiers.shift, key)
    }

    /// An unmodified key.
    pub fn plain(key: &str) -> Self {
        Self::from_raw(false, false, false, false, key)
    }

    /// Build from raw modifier flags as a UI surface reports them.
    pub fn from_raw(alt: bool, ctrl: bool, meta: bool, shift: bool, key: &str) -> Self {
        let key = normalize_key_name(key);
        let mut mods = 0u8;
        if alt {
            mods |= MOD_ALT;
        }
        if ctrl {
            mods |= MOD_CTRL;
        }
        if meta {
            mods |= MOD_META;
        }
        if shift && !is_printable_char(&key) {
            mods |= MOD_SHIFT;
        }
        Self { mods, key }
    }

    pub fn alt(&self) -> bool {
        self.mods & MOD_ALT != 0
    }

    pub fn ctrl(&self) -> bool {
        self.mods & MOD_CTRL != 0
    }

    pub fn meta(&self) -> bool {
        self.mods & MOD_META != 0
    }

    pub fn shift(&self) -> bool {
        self.mods & MOD_SHIFT != 0
    }

    /// A press of a modifier key on its own, which never advances a sequence.
    pub fn is_modifier_only(&self) -> bool {
        matches!(
            self.key.as_str(),
            "Alt" | "AltGraph" | "Control" | "Meta" | "OS" | "Shift" | "Super"
        )
    }

    /// Render as a chord string: `g`, `<C-x>`, `<A-C-Enter>`, `<Space>`.
    pub fn to_mapstr(&self) -> String {
        let mut out = String::new();
        for (bit, letter) in MOD_LETTERS {
            if self.mods & bit != 0 {
                out.push(letter);
                out.push('-');
            }
        }
        let key = match self.key.as_str() {
            " " => "Space",
            "<" if self.mods == 0 => "lt",
            other => other,
        };
        out.push_str(key);
        if out.chars().count() > 1 {
            format!("<{out}>")
        } else {
            out
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mapstr())
    }
}

/// A single visible character. Space is not one.
fn is_printable_char(key: &str) -> bool {
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_whitespace())
}

/// Map aliases and differently-cased spellings of named keys onto one form.
/// Single characters are kept verbatim; unknown names are kept as given.
pub(crate) fn normalize_key_name(name: &str) -> String {
    if name.chars().count() == 1 {
        return name.to_string();
    }
    let lower = name.to_lowercase();
    let named = match lower.as_str() {
        "cr" | "return" | "enter" => "Enter",
        "space" => " ",
        "bar" => "|",
        "del" | "delete" => "Delete",
        "bs" | "backspace" => "Backspace",
        "lt" => "<",
        "gt" => ">",
        "esc" | "escape" => "Escape",
        "tab" => "Tab",
        "insert" | "ins" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        "up" | "arrowup" => "ArrowUp",
        "down" | "arrowdown" => "ArrowDown",
        "left" | "arrowleft" => "ArrowLeft",
        "right" | "arrowright" => "ArrowRight",
        "control" | "ctrl" => "Control",
        "shift" => "Shift",
        "alt" => "Alt",
        "meta" => "Meta",
        _ => return function_key(&lower).unwrap_or_else(|| name.to_string()),
    };
    named.to_string()
}

fn function_key(lower: &str) -> Option<String> {
    let digits = lower.strip_prefix('f')?;
    let n: u8 = digits.parse().ok()?;
    (1..=24).contains(&n).then(|| format!("F{n}"))
}
