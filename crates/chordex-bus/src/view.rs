//! Location-transparent access to a channel's operations.

use std::collections::HashMap;
use std::sync::Arc;

use chordex_common::{BusError, ContextIdentity, TabId};
use serde_json::Value;

use crate::handler::Handler;
use crate::realm::Realm;

/// Where a remote operation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The focused tab.
    Active,
    /// The top frame of the tab the calling realm lives in.
    Own,
    Coordinator,
    Tab(TabId),
    /// Every other realm; the result is an array of the replies that arrived.
    Broadcast,
}

/// How one operation will run.
#[derive(Clone)]
pub enum Operation {
    Local(Arc<dyn Handler>),
    Remote(Target),
}

/// A channel seen from one realm.
///
/// The operation table is built once from the channel's interface: names
/// the local handler implements are called directly, with no
/// serialization, and every other name gets a forwarder to `target`.
/// Names outside the interface are rejected without touching the bus.
pub struct OperationView {
    realm: Arc<Realm>,
    channel: String,
    operations: HashMap<&'static str, Operation>,
}

impl OperationView {
    pub fn new(
        realm: Arc<Realm>,
        channel: &str,
        interface: &'static [&'static str],
        target: Target,
        local: Option<Arc<dyn Handler>>,
    ) -> Self {
        let operations = interface
            .iter()
            .map(|&method| {
                let op = match &local {
                    Some(handler) if handler.has_method(method) => {
                        Operation::Local(Arc::clone(handler))
                    }
                    _ => Operation::Remote(target),
                };
                (method, op)
            })
            .collect();
        Self {
            realm,
            channel: channel.to_string(),
            operations,
        }
    }

    /// A view with no local implementation: every method is remote.
    pub fn remote(
        realm: Arc<Realm>,
        channel: &str,
        interface: &'static [&'static str],
        target: Target,
    ) -> Self {
        Self::new(realm, channel, interface, target, None)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn operation(&self, method: &str) -> Option<&Operation> {
        self.operations.get(method)
    }

    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, BusError> {
        let operation = self.operation(method).ok_or_else(|| BusError::NoSuchMethod {
            channel: self.channel.clone(),
            method: method.to_string(),
        })?;
        match operation {
            Operation::Local(handler) => handler.call(method, args).await,
            Operation::Remote(Target::Broadcast) => Ok(Value::Array(
                self.realm.broadcast(&self.channel, method, args).await,
            )),
            Operation::Remote(target) => {
                let to = resolve(&self.realm, *target).await?;
                self.realm.call(to, &self.channel, method, args).await
            }
        }
    }
}

/// Resolve a point-to-point target from `realm`'s point of view.
pub async fn resolve(realm: &Realm, target: Target) -> Result<ContextIdentity, BusError> {
    match target {
        Target::Active => realm.router().active().await.ok_or(BusError::NoActiveRealm),
        Target::Own => realm
            .id()
            .owning_tab()
            .ok_or_else(|| BusError::NoOwnRealm(realm.id().to_string())),
        Target::Coordinator => Ok(ContextIdentity::coordinator()),
        Target::Tab(tab_id) => Ok(ContextIdentity::tab(tab_id)),
        Target::Broadcast => Err(BusError::Unreachable("broadcast is not a single realm".into())),
    }
}
