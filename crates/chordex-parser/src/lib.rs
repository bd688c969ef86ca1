//! Lexing and restartable parsing for ex strings and chord bracket expressions.
//!
//! The [`Parser`] engine wraps any [`Grammar`] and adds checkpointing plus the
//! feed-until-error protocol: fragments are fed one at a time, the most recent
//! complete result is remembered, and the first failing fragment stops the
//! parse and hands back the unconsumed remainder. The parser always returns to
//! its pristine checkpoint afterwards, so one instance serves any number of
//! independent parses.

pub mod bracket;
pub mod engine;
pub mod ex;
pub mod lexer;

pub use bracket::{BracketExpr, BracketExprGrammar, Modifiers};
pub use engine::{Grammar, Parser, ParserCheckpoint};
pub use ex::{parse_exstr, ExAst, ExGrammar};
pub use lexer::{Lexeme, Lexer, TokenKind, TokenRule};
