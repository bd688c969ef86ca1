//! Command registry: named implementations and where they must run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chordex_common::CommandError;
use serde_json::Value;

use crate::args::ParamType;
use crate::dispatcher::Dispatcher;

/// Which realm kind may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Only the coordinator.
    Coordinator,
    /// Only a tab's top frame.
    Ui,
    /// Any realm, locally.
    Anywhere,
}

#[async_trait]
pub trait Command: Send + Sync {
    async fn run(&self, ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError>;
}

#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub placement: Placement,
    pub params: Vec<ParamType>,
    pub command: Arc<dyn Command>,
}

/// The commands one realm knows about. Every realm carries the whole
/// catalog; placement decides whether a command runs here or is forwarded.
#[derive(Clone, Default)]
pub struct Registry {
    commands: HashMap<String, CommandSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        name: &str,
        placement: Placement,
        params: &[ParamType],
        command: Arc<dyn Command>,
    ) -> &mut Self {
        self.commands.insert(
            name.to_string(),
            CommandSpec {
                name: name.to_string(),
                placement,
                params: params.to_vec(),
                command,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
