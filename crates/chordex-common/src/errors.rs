use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures turning an ex string (or a chord string) into something usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The very first fragment was already invalid: there is no usable result.
    #[error("no valid parse: {0}")]
    NoResult(String),

    #[error("unexpected token at position {pos}")]
    Lex { pos: usize },

    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("not an excmd: {0}")]
    UnknownCommand(String),

    #[error("bad argument for {command}: {reason}")]
    Argument { command: String, reason: String },

    #[error("infinite loop detected while expanding aliases: {}", .0.join(" -> "))]
    AliasLoop(Vec<String>),
}

/// Failures of the realm-to-realm transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("realm unreachable: {0}")]
    Unreachable(String),

    #[error("no handler registered for channel {0}")]
    NoSuchChannel(String),

    #[error("missing handler in protocol {channel} {method}")]
    NoSuchMethod { channel: String, method: String },

    #[error("wrong arguments in protocol {channel} {method}: {reason}")]
    BadArguments {
        channel: String,
        method: String,
        reason: String,
    },

    #[error("remote error: {0}")]
    Remote(String),

    #[error("message codec error: {0}")]
    Codec(String),

    #[error("can't message own tab from {0}")]
    NoOwnRealm(String),

    #[error("no active tab")]
    NoActiveRealm,
}

/// A resolved command raised while running.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("command {0} has no implementation reachable from this realm")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChordexError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
