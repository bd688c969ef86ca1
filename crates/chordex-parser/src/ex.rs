//! Ex-string grammar: `command arg*`.

use chordex_common::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{Grammar, Parser};
use crate::lexer::{Lexer, TokenKind};

/// A parsed ex string. `command` is still unresolved: the dispatcher maps it
/// onto the command registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExAst {
    pub command: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ExState {
    text: String,
    ast: Option<ExAst>,
}

/// Fragments may be any size; the text fed so far is re-lexed on every feed.
pub struct ExGrammar {
    lexer: &'static Lexer,
}

impl ExGrammar {
    pub fn new() -> Self {
        Self {
            lexer: Lexer::exmode(),
        }
    }
}

impl Default for ExGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for ExGrammar {
    type State = ExState;
    type Output = ExAst;

    fn start(&self) -> ExState {
        ExState::default()
    }

    fn feed(&self, state: &mut ExState, fragment: &str) -> Result<(), ParseError> {
        let mut text = state.text.clone();
        text.push_str(fragment);

        let lexemes = self.lexer.tokenize(&text)?;
        let mut tokens = lexemes.into_iter();
        let ast = match tokens.next() {
            None => None,
            Some(first) if first.kind == TokenKind::Argument => Some(ExAst {
                command: first.raw,
                args: tokens.map(|l| l.value).collect(),
            }),
            Some(first) => {
                return Err(ParseError::Grammar(format!(
                    "expected a command name at position {}, found {:?} {:?}",
                    first.pos, first.kind, first.raw
                )))
            }
        };

        state.text = text;
        state.ast = ast;
        Ok(())
    }

    fn results(&self, state: &ExState) -> Vec<ExAst> {
        state.ast.iter().cloned().collect()
    }
}

/// Parse a whole ex string in one fragment.
pub fn parse_exstr(exstr: &str) -> Result<ExAst, ParseError> {
    let mut parser = Parser::new(ExGrammar::new());
    parser.feed_until_error(&[exstr]).map(|(ast, _)| ast)
}
