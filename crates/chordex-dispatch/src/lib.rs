//! Ex-command dispatch.
//!
//! [`Dispatcher::accept_ex_cmd`] is the single entry point: it expands
//! aliases, parses, resolves the command against the realm's [`Registry`],
//! records the last command, and runs it here or in the realm that owns it.
//! It never returns an error; failures are logged and reported in the
//! [`Outcome`].

pub mod args;
pub mod controller;
pub mod dispatcher;
pub mod registry;
pub mod repeat;

#[cfg(test)]
mod tests;

pub use args::{convert_args, ParamType};
pub use controller::{ControllerHandler, CONTROLLER_CHANNEL, CONTROLLER_METHODS};
pub use dispatcher::{Dispatcher, Outcome, Resolved, Route};
pub use registry::{Command, CommandSpec, Placement, Registry};
pub use repeat::{Repeat, REPEAT_COMMAND};
