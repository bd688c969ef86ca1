//! Ordered-rule lexer.
//!
//! Each rule is an anchored regex tried against the remaining input; the first
//! rule that matches wins, so rule order encodes priority.

use std::sync::LazyLock;

use chordex_common::ParseError;
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    ShortArgMulti,
    ShortArgSingle,
    StringLit,
    NumLit,
    BoolLit,
    Argument,
}

type Processor = fn(&str) -> Result<Value, String>;

pub struct TokenRule {
    kind: TokenKind,
    pattern: Regex,
    processor: Processor,
}

impl TokenRule {
    /// Build a rule. The pattern is anchored at the start of the remaining input.
    pub fn new(kind: TokenKind, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(&format!("^(?:{pattern})"))?,
            processor: raw_string,
        })
    }

    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

/// One recognized token.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: TokenKind,
    /// 1-based byte position of the token in the input.
    pub pos: usize,
    pub raw: String,
    pub value: Value,
}

pub struct Lexer {
    rules: Vec<TokenRule>,
}

static EXMODE: LazyLock<Lexer> = LazyLock::new(|| {
    let rules = vec![
        // Clusters before singles, or "-ab" would lex as "-a" "b".
        TokenRule::new(TokenKind::ShortArgMulti, r"-[a-zA-Z]{2,}"),
        TokenRule::new(TokenKind::ShortArgSingle, r"-[a-zA-Z]"),
        TokenRule::new(TokenKind::StringLit, r#""(?:\\"|[^"])*?""#)
            .map(|r| r.with_processor(string_literal)),
        TokenRule::new(TokenKind::NumLit, r"\d+(?:\.\d+)?").map(|r| r.with_processor(number)),
        TokenRule::new(TokenKind::BoolLit, r"(?:true|false)").map(|r| r.with_processor(boolean)),
        TokenRule::new(TokenKind::Argument, r"\S+"),
    ];
    Lexer::new(
        rules
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap(),
    )
});

impl Lexer {
    pub fn new(rules: Vec<TokenRule>) -> Self {
        Self { rules }
    }

    /// The lexical grammar for ex strings.
    pub fn exmode() -> &'static Lexer {
        &EXMODE
    }

    /// Split `input` into lexemes. Whitespace between tokens and trailing
    /// whitespace are ignored.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Lexeme>, ParseError> {
        let mut lexemes = Vec::new();
        let mut offset = 0;

        loop {
            let rest = &input[offset..];
            let trimmed = rest.trim_start();
            offset += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                return Ok(lexemes);
            }

            let pos = offset + 1;
            let (rule, raw) = self
                .rules
                .iter()
                .find_map(|rule| rule.pattern.find(trimmed).map(|m| (rule, m.as_str())))
                .ok_or(ParseError::Lex { pos })?;

            let value = (rule.processor)(raw).map_err(|reason| {
                ParseError::Grammar(format!("bad {:?} at position {pos}: {reason}", rule.kind))
            })?;

            lexemes.push(Lexeme {
                kind: rule.kind,
                pos,
                raw: raw.to_string(),
                value,
            });
            offset += raw.len();
        }
    }
}

fn raw_string(raw: &str) -> Result<Value, String> {
    Ok(Value::String(raw.to_string()))
}

fn string_literal(raw: &str) -> Result<Value, String> {
    serde_json::from_str::<String>(raw)
        .map(Value::String)
        .map_err(|e| e.to_string())
}

fn number(raw: &str) -> Result<Value, String> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(Value::from(n));
    }
    raw.parse::<f64>()
        .map_err(|e| e.to_string())
        .and_then(|f| {
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("not a finite number: {raw}"))
        })
}

fn boolean(raw: &str) -> Result<Value, String> {
    Ok(Value::Bool(raw == "true"))
}
