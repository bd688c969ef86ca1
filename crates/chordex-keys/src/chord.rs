//! Chord strings: `gg`, `g g`, `<C-x>`, `<A-S-Enter>j`.

use chordex_common::ParseError;
use chordex_parser::{BracketExprGrammar, Parser};

use crate::key::KeyEvent;

/// Parse a chord string into canonical key events.
///
/// Whitespace separates chords and is never a key itself (write `<Space>`).
/// A `<` that does not open a valid bracket expression is the literal `<` key.
pub fn parse_chord(chord: &str) -> Result<Vec<KeyEvent>, ParseError> {
    let mut parser = Parser::new(BracketExprGrammar);
    let mut keys = Vec::new();
    let mut rest = chord.trim_start();

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Ok((expr, remainder)) = parser.feed_chars_until_error(rest) {
                keys.push(KeyEvent::new(&expr.key, expr.modifiers));
                rest = &rest[rest.len() - remainder.len()..];
                rest = rest.trim_start();
                continue;
            }
        }
        keys.push(KeyEvent::plain(&c.to_string()));
        rest = rest[c.len_utf8()..].trim_start();
    }

    if keys.is_empty() {
        return Err(ParseError::Grammar(format!("chord {chord:?} has no keys")));
    }
    Ok(keys)
}
