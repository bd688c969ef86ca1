//! The `controller` channel: lets other realms run ex strings and
//! commands in this one.

use std::sync::Weak;

use async_trait::async_trait;
use chordex_bus::{arg_str, Handler};
use chordex_common::BusError;
use serde_json::Value;

use crate::dispatcher::Dispatcher;

pub const CONTROLLER_CHANNEL: &str = "controller";

/// The operations every realm's `controller` channel serves.
pub const CONTROLLER_METHODS: &[&str] = &["acceptExCmd", "run"];

/// `acceptExCmd(exstr)` goes through the full accept path (memo included)
/// and answers with the outcome. `run(name, args...)` runs a local command
/// directly and is what forwarded commands arrive as.
pub struct ControllerHandler {
    dispatcher: Weak<Dispatcher>,
}

impl ControllerHandler {
    pub fn new(dispatcher: Weak<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Handler for ControllerHandler {
    fn methods(&self) -> &'static [&'static str] {
        CONTROLLER_METHODS
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, BusError> {
        let dispatcher = self
            .dispatcher
            .upgrade()
            .ok_or_else(|| BusError::NoSuchChannel(CONTROLLER_CHANNEL.into()))?;

        match method {
            "acceptExCmd" => {
                let exstr = arg_str(&args, 0, CONTROLLER_CHANNEL, method)?;
                Ok(dispatcher.accept_ex_cmd(exstr).await.to_json())
            }
            "run" => {
                let name = arg_str(&args, 0, CONTROLLER_CHANNEL, method)?.to_string();
                let rest = args.into_iter().skip(1).collect();
                dispatcher
                    .run(&name, rest)
                    .await
                    .map_err(|e| BusError::Remote(e.to_string()))
            }
            _ => Err(BusError::NoSuchMethod {
                channel: CONTROLLER_CHANNEL.into(),
                method: method.into(),
            }),
        }
    }
}
