//! Best-effort advisory lock over the message bus.
//!
//! Each realm keeps only the names it holds and the names it is waiting
//! for. Acquiring asks every other realm whether it holds the name and
//! polls until nobody does. A realm that is itself waiting also answers
//! true to askers whose request is younger than its own, so overlapping
//! acquires are served oldest first. Probe targets that fail or time out
//! count as free.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chordex_bus::{arg_str, Handler, Realm};
use chordex_common::BusError;
use serde_json::Value;
use tracing::debug;

pub const LOCK_CHANNEL: &str = "lock";

/// When a realm started waiting for a lock. Older tickets win; the realm
/// name breaks ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Ticket {
    stamp: u64,
    realm: String,
}

impl Ticket {
    fn now(realm: &Realm) -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();
        Self {
            stamp,
            realm: realm.id().to_string(),
        }
    }

    fn to_args(&self, name: &str) -> Vec<Value> {
        vec![
            Value::from(name),
            Value::from(self.stamp),
            Value::from(self.realm.as_str()),
        ]
    }

    fn from_args(args: &[Value]) -> Option<Self> {
        Some(Self {
            stamp: args.get(1)?.as_u64()?,
            realm: args.get(2)?.as_str()?.to_string(),
        })
    }
}

#[derive(Default)]
struct LockState {
    held: HashSet<String>,
    waiting: HashMap<String, Ticket>,
}

impl LockState {
    /// Whether this realm should tell `asker` that `name` is taken.
    fn blocks(&self, name: &str, asker: Option<&Ticket>) -> bool {
        if self.held.contains(name) {
            return true;
        }
        match (self.waiting.get(name), asker) {
            (Some(mine), Some(theirs)) => mine < theirs,
            _ => false,
        }
    }
}

type SharedState = Arc<Mutex<LockState>>;

pub struct LockManager {
    realm: Arc<Realm>,
    state: SharedState,
    poll_interval: Duration,
}

impl LockManager {
    /// Create the manager and serve contention probes on the `lock` channel.
    pub fn install(realm: Arc<Realm>, poll_interval: Duration) -> Arc<Self> {
        let state: SharedState = Arc::new(Mutex::new(LockState::default()));
        realm.register_handler(
            LOCK_CHANNEL,
            Arc::new(LockHandler {
                state: Arc::clone(&state),
            }),
        );
        Arc::new(Self {
            realm,
            state,
            poll_interval,
        })
    }

    /// Wait until no other realm reports holding `name`, then hold it.
    ///
    /// Returns immediately if this realm already holds it.
    pub async fn acquire(&self, name: &str) {
        if self.holds(name) {
            return;
        }
        let waiting = Waiting::start(self, name);

        loop {
            let replies = self
                .realm
                .broadcast(LOCK_CHANNEL, "holds", waiting.ticket.to_args(name))
                .await;
            if !replies.iter().any(|held| held.as_bool() == Some(true)) {
                break;
            }
            debug!(realm = %self.realm.id(), lock = name, "lock contended, retrying");
            tokio::time::sleep(self.poll_interval).await;
        }

        waiting.finish();
        debug!(realm = %self.realm.id(), lock = name, "lock acquired");
    }

    /// Drop local ownership. Nothing is sent; returns whether it was held.
    pub fn release(&self, name: &str) -> bool {
        let released = self
            .state
            .lock()
            .map(|mut state| state.held.remove(name))
            .unwrap_or(false);
        if released {
            debug!(realm = %self.realm.id(), lock = name, "lock released");
        }
        released
    }

    pub fn holds(&self, name: &str) -> bool {
        self.state
            .lock()
            .map(|state| state.held.contains(name))
            .unwrap_or(false)
    }
}

/// A pending acquire. Dropping it without `finish` withdraws the request.
struct Waiting<'a> {
    state: &'a SharedState,
    name: &'a str,
    ticket: Ticket,
    done: bool,
}

impl<'a> Waiting<'a> {
    fn start(manager: &'a LockManager, name: &'a str) -> Self {
        let fresh = Ticket::now(&manager.realm);
        let ticket = match manager.state.lock() {
            Ok(mut state) => state.waiting.entry(name.to_string()).or_insert(fresh).clone(),
            Err(_) => fresh,
        };
        Self {
            state: &manager.state,
            name,
            ticket,
            done: false,
        }
    }

    fn finish(mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.waiting.remove(self.name);
            state.held.insert(self.name.to_string());
        }
        self.done = true;
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.waiting.remove(self.name);
        }
    }
}

/// Answers `holds(name, [stamp, realm])` probes from other realms.
struct LockHandler {
    state: SharedState,
}

#[async_trait]
impl Handler for LockHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["holds"]
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, BusError> {
        let name = arg_str(&args, 0, LOCK_CHANNEL, method)?;
        let asker = Ticket::from_args(&args);
        let blocks = self
            .state
            .lock()
            .map(|state| state.blocks(name, asker.as_ref()))
            .unwrap_or(false);
        Ok(Value::Bool(blocks))
    }
}
