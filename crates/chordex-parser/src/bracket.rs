//! Bracket-expression grammar for chord strings.
//!
//! ```text
//! bracketexpr ::= '<' (modifier '-')* key '>'
//! modifier    ::= 'A' | 'C' | 'M' | 'S'        (case-insensitive)
//! key         ::= '<' | '>' | '-' | [^\s<>-]+
//! ```

use chordex_common::ParseError;
use serde::{Deserialize, Serialize};

use crate::engine::Grammar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }

    fn set(&mut self, letter: char) {
        match letter.to_ascii_uppercase() {
            'A' => self.alt = true,
            'C' => self.ctrl = true,
            'M' => self.meta = true,
            'S' => self.shift = true,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketExpr {
    pub modifiers: Modifiers,
    pub key: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Start,
    Body,
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct BracketState {
    stage: Stage,
    body: String,
    done: Option<BracketExpr>,
}

pub struct BracketExprGrammar;

impl Grammar for BracketExprGrammar {
    type State = BracketState;
    type Output = BracketExpr;

    fn start(&self) -> BracketState {
        BracketState::default()
    }

    fn feed(&self, state: &mut BracketState, fragment: &str) -> Result<(), ParseError> {
        for c in fragment.chars() {
            step(state, c)?;
        }
        Ok(())
    }

    fn results(&self, state: &BracketState) -> Vec<BracketExpr> {
        state.done.iter().cloned().collect()
    }
}

fn step(state: &mut BracketState, c: char) -> Result<(), ParseError> {
    match state.stage {
        Stage::Start if c == '<' => {
            state.stage = Stage::Body;
            Ok(())
        }
        Stage::Start => Err(unexpected(c, "expected '<'")),
        Stage::Closed => Err(unexpected(c, "bracket expression already closed")),
        Stage::Body if c.is_whitespace() => Err(unexpected(c, "whitespace in bracket expression")),
        Stage::Body => {
            let (modifiers, key) = split_body(&state.body);
            if c == '>' && key.is_empty() {
                // `<>>` and `<C->>`: the first '>' is the key itself.
                state.body.push(c);
                return Ok(());
            }
            if c == '>' {
                if !is_valid_key(key) {
                    return Err(ParseError::Grammar(format!("invalid key name {key:?}")));
                }
                state.done = Some(BracketExpr {
                    modifiers,
                    key: key.to_string(),
                });
                state.stage = Stage::Closed;
                return Ok(());
            }
            if matches!(key, "<" | ">") || (c == '<' && !key.is_empty()) {
                return Err(unexpected(c, "angle bracket inside key name"));
            }
            state.body.push(c);
            Ok(())
        }
    }
}

/// Peel `X-` modifier prefixes off the body; whatever follows is the key.
fn split_body(body: &str) -> (Modifiers, &str) {
    let mut modifiers = Modifiers::default();
    let mut rest = body;
    loop {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), Some('-')) if is_modifier_letter(letter) => {
                modifiers.set(letter);
                rest = &rest[2..];
            }
            _ => return (modifiers, rest),
        }
    }
}

fn is_modifier_letter(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'M' | 'S')
}

fn is_valid_key(key: &str) -> bool {
    match key {
        "<" | ">" | "-" => true,
        "" => false,
        _ => !key.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '-')),
    }
}

fn unexpected(c: char, why: &str) -> ParseError {
    ParseError::Grammar(format!("unexpected {c:?}: {why}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Parser;

    fn parse(input: &str) -> Result<(BracketExpr, String), ParseError> {
        Parser::new(BracketExprGrammar).feed_chars_until_error(input)
    }

    #[test]
    fn plain_named_key() {
        let (expr, rest) = parse("<Enter>").unwrap();
        assert_eq!(expr.key, "Enter");
        assert!(!expr.modifiers.any());
        assert!(rest.is_empty());
    }

    #[test]
    fn modifiers_are_case_insensitive() {
        let (expr, rest) = parse("<c-S-x>gg").unwrap();
        assert!(expr.modifiers.ctrl && expr.modifiers.shift);
        assert!(!expr.modifiers.alt && !expr.modifiers.meta);
        assert_eq!(expr.key, "x");
        assert_eq!(rest, "gg");
    }

    #[test]
    fn angle_bracket_and_dash_keys() {
        assert_eq!(parse("<<>").unwrap().0.key, "<");
        assert_eq!(parse("<>>").unwrap().0.key, ">");
        assert_eq!(parse("<C->>").unwrap().0.key, ">");
        assert_eq!(parse("<A-->").unwrap().0.key, "-");
        assert!(parse("<A-->").unwrap().0.modifiers.alt);
    }

    #[test]
    fn modifier_letter_alone_is_a_key() {
        let (expr, _) = parse("<C>").unwrap();
        assert_eq!(expr.key, "C");
        assert!(!expr.modifiers.ctrl);
    }

    #[test]
    fn unterminated_or_spaced_expressions_fail() {
        assert!(parse("<C-x").is_err());
        assert!(parse("<C x>").is_err());
        assert!(parse("x").is_err());
        assert!(parse("<>").is_err());
    }
}
