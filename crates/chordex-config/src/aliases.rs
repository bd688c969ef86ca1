//! Command alias expansion.

use chordex_common::ParseError;
use std::collections::BTreeMap;

/// Replace the leading command word with its alias expansion, repeatedly,
/// until the command is not an alias. Arguments after the command word are
/// kept after the expansion.
///
/// An alias that reappears in its own expansion chain is an error.
pub fn expand_exstr(exstr: &str, aliases: &BTreeMap<String, String>) -> Result<String, ParseError> {
    let mut current = exstr.to_string();
    let mut chain: Vec<String> = Vec::new();

    loop {
        let (command, rest) = split_command(&current);
        let Some(expansion) = aliases.get(command) else {
            return Ok(current);
        };
        if chain.iter().any(|seen| seen == command) {
            chain.push(command.to_string());
            return Err(ParseError::AliasLoop(chain));
        }
        chain.push(command.to_string());

        current = if rest.is_empty() {
            expansion.clone()
        } else {
            format!("{expansion} {rest}")
        };
    }
}

fn split_command(exstr: &str) -> (&str, &str) {
    let trimmed = exstr.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (trimmed, ""),
    }
}
