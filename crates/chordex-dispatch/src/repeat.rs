use async_trait::async_trait;
use chordex_common::{clamp, CommandError};
use serde_json::Value;

use crate::args::ParamType;
use crate::dispatcher::Dispatcher;
use crate::registry::Command;

pub const REPEAT_COMMAND: &str = "repeat";

/// Upper bound on `repeat`'s count.
const MAX_REPEAT: u64 = 1000;

/// `repeat [n=1] [exstr...]`: run `exstr`, or the last command, `n` times.
/// `repeat 0` runs nothing.
pub struct Repeat;

impl Repeat {
    pub const PARAMS: &'static [ParamType] = &[ParamType::Number, ParamType::Rest];
}

#[async_trait]
impl Command for Repeat {
    async fn run(&self, ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        let n = args
            .first()
            .and_then(Value::as_f64)
            .map(|n| clamp(n.max(0.0) as u64, 0, MAX_REPEAT))
            .unwrap_or(1);

        let given: Vec<&str> = args
            .get(1)
            .and_then(Value::as_array)
            .map(|words| words.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let exstr = if given.is_empty() {
            ctx.last_command()
                .ok_or_else(|| CommandError::Failed("no command to repeat".into()))?
        } else {
            given.join(" ")
        };

        let mut executed = 0u64;
        for _ in 0..n {
            if ctx.accept_ex_cmd(&exstr).await.is_executed() {
                executed += 1;
            }
        }
        Ok(Value::from(executed))
    }
}
