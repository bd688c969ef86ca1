//! The demo command catalog every realm is built with.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chordex_common::CommandError;
use chordex_dispatch::{Command, Dispatcher, ParamType, Placement, Registry, Repeat, REPEAT_COMMAND};
use chordex_keys::Mode;
use chordex_lock::LockManager;
use serde_json::Value;
use tracing::info;

/// A tab's current interaction mode, shared by its key loop and its
/// `mode` command.
pub type ModeState = Arc<Mutex<Mode>>;

/// Build the registry for one realm. `mode` is `None` in the coordinator.
pub fn catalog(locks: Arc<LockManager>, mode: Option<ModeState>) -> Registry {
    let mut registry = Registry::new();
    registry
        .register("echo", Placement::Anywhere, &[ParamType::Rest], Arc::new(Echo))
        .register("tabfocus", Placement::Coordinator, &[ParamType::Number], Arc::new(TabFocus))
        .register(
            "lock",
            Placement::Anywhere,
            &[ParamType::String],
            Arc::new(Lock(Arc::clone(&locks))),
        )
        .register("unlock", Placement::Anywhere, &[ParamType::String], Arc::new(Unlock(locks)))
        .register(REPEAT_COMMAND, Placement::Anywhere, Repeat::PARAMS, Arc::new(Repeat))
        .register("mode", Placement::Ui, &[ParamType::String], Arc::new(SetMode(mode)));
    registry
}

fn string_arg(args: &[Value], index: usize, command: &str) -> Result<String, CommandError> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CommandError::Failed(format!("{command}: missing argument {}", index + 1)))
}

/// `echo [words...]`
struct Echo;

#[async_trait]
impl Command for Echo {
    async fn run(&self, ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let text = args
            .first()
            .and_then(Value::as_array)
            .map(|words| {
                words
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        info!(realm = %ctx.realm().id(), "echo: {text}");
        Ok(Value::String(text))
    }
}

/// `tabfocus n`
struct TabFocus;

#[async_trait]
impl Command for TabFocus {
    async fn run(&self, ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let tab = args
            .first()
            .and_then(Value::as_f64)
            .ok_or_else(|| CommandError::Failed("tabfocus: missing tab number".into()))?;
        ctx.realm().router().focus(tab as i32).await?;
        Ok(Value::from(tab as i32))
    }
}

/// `lock name`
struct Lock(Arc<LockManager>);

#[async_trait]
impl Command for Lock {
    async fn run(&self, _ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let name = string_arg(&args, 0, "lock")?;
        self.0.acquire(&name).await;
        Ok(Value::Bool(true))
    }
}

/// `unlock name`
struct Unlock(Arc<LockManager>);

#[async_trait]
impl Command for Unlock {
    async fn run(&self, _ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let name = string_arg(&args, 0, "unlock")?;
        Ok(Value::Bool(self.0.release(&name)))
    }
}

/// `mode normal|insert|input|ignore`
struct SetMode(Option<ModeState>);

#[async_trait]
impl Command for SetMode {
    async fn run(&self, ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let state = self
            .0
            .as_ref()
            .ok_or_else(|| CommandError::Unavailable("mode".into()))?;
        let mode: Mode = string_arg(&args, 0, "mode")?
            .parse()
            .map_err(CommandError::Failed)?;
        if let Ok(mut current) = state.lock() {
            *current = mode;
        }
        info!(realm = %ctx.realm().id(), %mode, "mode changed");
        Ok(Value::String(mode.to_string()))
    }
}
