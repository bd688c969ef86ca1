//! One isolated execution context on the bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use chordex_common::{BusError, ContextIdentity, MessageId};
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::envelope::{Envelope, Message, Reply, Response};
use crate::handler::Handler;
use crate::router::Router;

const INBOX_CAPACITY: usize = 256;

/// A realm: an inbox on the router, the channels it serves, and the
/// requests it is waiting on.
///
/// Requests are answered by spawned tasks, so a handler that itself awaits
/// the bus never stalls the inbox. Messages from one sender are taken off
/// the inbox in send order, but their handlers may run concurrently and
/// finish in any order.
pub struct Realm {
    id: ContextIdentity,
    router: Router,
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
    pending: Mutex<HashMap<MessageId, oneshot::Sender<Reply>>>,
    broadcast_timeout: Duration,
}

impl Realm {
    /// Create a realm, register it on the router, and start its inbox loop.
    pub async fn spawn(id: ContextIdentity, router: Router, broadcast_timeout: Duration) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<String>(INBOX_CAPACITY);
        let realm = Arc::new(Self {
            id,
            router: router.clone(),
            handlers: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            broadcast_timeout,
        });

        if router.register(id, tx).await.is_some() {
            warn!(realm = %id, "realm re-registered, previous inbox replaced");
        }
        tokio::spawn(inbox_loop(Arc::downgrade(&realm), rx));
        debug!(realm = %id, "realm started");
        realm
    }

    pub fn id(&self) -> ContextIdentity {
        self.id
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn broadcast_timeout(&self) -> Duration {
        self.broadcast_timeout
    }

    /// Bind `channel` to `handler`, replacing any previous binding.
    pub fn register_handler(&self, channel: &str, handler: Arc<dyn Handler>) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.insert(channel.to_string(), handler);
        }
    }

    pub fn handler(&self, channel: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().ok()?.get(channel).cloned()
    }

    /// Leave the router. Calls still waiting on this realm never resolve.
    pub async fn shutdown(&self) {
        self.router.unregister(&self.id).await;
        debug!(realm = %self.id, "realm stopped");
    }

    /// Point-to-point call to one realm.
    pub async fn call(
        &self,
        to: ContextIdentity,
        channel: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, BusError> {
        let id = MessageId::new();
        let (tx, rx) = oneshot::channel();
        self.lock_pending()?.insert(id.clone(), tx);
        let _pending = PendingCall {
            realm: self,
            id: id.clone(),
        };

        let envelope = Envelope::Request(Message {
            id: id.clone(),
            channel: channel.to_string(),
            method: method.to_string(),
            args,
            sender: self.id,
        });
        self.router.deliver(&to, &envelope).await?;
        debug!(realm = %self.id, %to, channel, method, "request sent");

        match rx.await {
            Ok(reply) => reply.into_result(),
            Err(_) => Err(BusError::Unreachable(to.to_string())),
        }
    }

    /// Call every other realm and collect the successful replies.
    ///
    /// A target that is unreachable, errors, or does not answer within the
    /// broadcast timeout is left out of the result.
    pub async fn broadcast(&self, channel: &str, method: &str, args: Vec<Value>) -> Vec<Value> {
        let targets: Vec<ContextIdentity> = self
            .router
            .realms()
            .await
            .into_iter()
            .filter(|id| *id != self.id)
            .collect();

        let calls = targets.into_iter().map(|to| {
            let args = args.clone();
            async move {
                match tokio::time::timeout(
                    self.broadcast_timeout,
                    self.call(to, channel, method, args),
                )
                .await
                {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(e)) => {
                        debug!(realm = %self.id, %to, channel, method, error = %e, "broadcast target failed");
                        None
                    }
                    Err(_) => {
                        debug!(realm = %self.id, %to, channel, method, "broadcast target timed out");
                        None
                    }
                }
            }
        });

        join_all(calls).await.into_iter().flatten().collect()
    }

    fn lock_pending(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<MessageId, oneshot::Sender<Reply>>>, BusError> {
        self.pending
            .lock()
            .map_err(|_| BusError::Codec("pending table poisoned".into()))
    }

    fn on_envelope(self: &Arc<Self>, raw: String) {
        match Envelope::decode(&raw) {
            Ok(Envelope::Request(message)) => {
                let realm = Arc::clone(self);
                tokio::spawn(async move { realm.answer(message).await });
            }
            Ok(Envelope::Response(response)) => self.settle(response),
            Err(e) => warn!(realm = %self.id, error = %e, "dropping undecodable envelope"),
        }
    }

    async fn answer(&self, message: Message) {
        let result = match self.handler(&message.channel) {
            None => Err(BusError::NoSuchChannel(message.channel.clone())),
            Some(handler) if !handler.has_method(&message.method) => Err(BusError::NoSuchMethod {
                channel: message.channel.clone(),
                method: message.method.clone(),
            }),
            Some(handler) => handler.call(&message.method, message.args).await,
        };
        if let Err(e) = &result {
            debug!(realm = %self.id, channel = %message.channel, method = %message.method, error = %e, "request failed");
        }

        let response = Envelope::Response(Response {
            id: message.id,
            sender: self.id,
            reply: result.into(),
        });
        if let Err(e) = self.router.deliver(&message.sender, &response).await {
            debug!(realm = %self.id, to = %message.sender, error = %e, "reply undeliverable");
        }
    }

    fn settle(&self, response: Response) {
        let waiter = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(&response.id));
        match waiter {
            Some(tx) => {
                let _ = tx.send(response.reply);
            }
            None => debug!(realm = %self.id, id = %response.id, "response for unknown request"),
        }
    }
}

/// Removes a call's entry from the pending table when the call settles,
/// fails, or is dropped before a reply arrives.
struct PendingCall<'a> {
    realm: &'a Realm,
    id: MessageId,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.realm.pending.lock() {
            pending.remove(&self.id);
        }
    }
}

async fn inbox_loop(realm: Weak<Realm>, mut rx: mpsc::Receiver<String>) {
    while let Some(raw) = rx.recv().await {
        let Some(realm) = realm.upgrade() else {
            break;
        };
        realm.on_envelope(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Handler for Echo {
        fn methods(&self) -> &'static [&'static str] {
            &["echo", "fail"]
        }

        async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, BusError> {
            match method {
                "echo" => Ok(Value::Array(args)),
                _ => Err(BusError::Remote("asked to fail".into())),
            }
        }
    }

    /// Answers with its own tab id.
    struct WhoAmI(i32);

    #[async_trait]
    impl Handler for WhoAmI {
        fn methods(&self) -> &'static [&'static str] {
            &["who"]
        }

        async fn call(&self, _method: &str, _args: Vec<Value>) -> Result<Value, BusError> {
            Ok(json!(self.0))
        }
    }

    fn timeout() -> Duration {
        Duration::from_millis(200)
    }

    #[tokio::test]
    async fn call_round_trip() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;
        let b = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        b.register_handler("test", Arc::new(Echo));

        let value = a
            .call(b.id(), "test", "echo", vec![json!(1), json!("two")])
            .await
            .unwrap();
        assert_eq!(value, json!([1, "two"]));
    }

    #[tokio::test]
    async fn missing_channel_and_method_are_remote_errors() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;
        let b = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        b.register_handler("test", Arc::new(Echo));

        let err = a.call(b.id(), "nope", "echo", vec![]).await.unwrap_err();
        assert_eq!(err, BusError::Remote("no handler registered for channel nope".into()));

        let err = a.call(b.id(), "test", "nope", vec![]).await.unwrap_err();
        assert_eq!(err, BusError::Remote("missing handler in protocol test nope".into()));

        let err = a.call(b.id(), "test", "fail", vec![]).await.unwrap_err();
        assert!(matches!(err, BusError::Remote(_)));
    }

    #[tokio::test]
    async fn unregistered_target_is_unreachable() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;
        let err = a
            .call(ContextIdentity::tab(9), "test", "echo", vec![])
            .await
            .unwrap_err();
        assert_eq!(err, BusError::Unreachable("tab:9".into()));
    }

    #[tokio::test]
    async fn realm_can_call_itself() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        a.register_handler("test", Arc::new(Echo));
        let value = a.call(a.id(), "test", "echo", vec![json!(true)]).await.unwrap();
        assert_eq!(value, json!([true]));
    }

    #[tokio::test]
    async fn call_to_torn_down_realm_never_resolves() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;

        // Registered, but nothing ever reads the inbox.
        let (tx, _rx) = mpsc::channel(4);
        router.register(ContextIdentity::tab(5), tx).await;

        let pending = a.call(ContextIdentity::tab(5), "test", "echo", vec![]);
        let outcome = tokio::time::timeout(Duration::from_millis(100), pending).await;
        assert!(outcome.is_err());
        assert!(a.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn broadcast_omits_unreachable_targets() {
        let router = Router::new();
        let sender = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;

        let mut live = Vec::new();
        for tab in 1..=3 {
            let realm = Realm::spawn(ContextIdentity::tab(tab), router.clone(), timeout()).await;
            realm.register_handler("who", Arc::new(WhoAmI(tab)));
            live.push(realm);
        }

        // One realm whose inbox is gone, one that never answers.
        let (dead_tx, dead_rx) = mpsc::channel(4);
        router.register(ContextIdentity::tab(4), dead_tx).await;
        drop(dead_rx);
        let (mute_tx, _mute_rx) = mpsc::channel(4);
        router.register(ContextIdentity::tab(5), mute_tx).await;

        let mut replies = sender.broadcast("who", "who", vec![]).await;
        replies.sort_by_key(|v| v.as_i64());
        assert_eq!(replies, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn broadcast_excludes_sender_and_includes_coordinator() {
        let router = Router::new();
        let coordinator = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;
        coordinator.register_handler("who", Arc::new(WhoAmI(-1)));
        let tab = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        tab.register_handler("who", Arc::new(WhoAmI(1)));

        assert_eq!(tab.broadcast("who", "who", vec![]).await, vec![json!(-1)]);
    }

    #[tokio::test]
    async fn shutdown_leaves_router() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        assert!(router.contains(&a.id()).await);
        a.shutdown().await;
        assert!(!router.contains(&a.id()).await);
    }

    #[tokio::test]
    async fn timed_out_broadcasts_leave_no_pending_calls() {
        let router = Router::new();
        let sender = Realm::spawn(
            ContextIdentity::coordinator(),
            router.clone(),
            Duration::from_millis(20),
        )
        .await;
        let (mute_tx, _mute_rx) = mpsc::channel(64);
        router.register(ContextIdentity::tab(1), mute_tx).await;

        for _ in 0..10 {
            assert!(sender.broadcast("lock", "holds", vec![json!("x")]).await.is_empty());
        }
        assert!(sender.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn answered_calls_leave_no_pending_calls() {
        let router = Router::new();
        let a = Realm::spawn(ContextIdentity::coordinator(), router.clone(), timeout()).await;
        let b = Realm::spawn(ContextIdentity::tab(1), router.clone(), timeout()).await;
        b.register_handler("test", Arc::new(Echo));

        a.call(b.id(), "test", "echo", vec![]).await.unwrap();
        let _ = a.call(ContextIdentity::tab(7), "test", "echo", vec![]).await;
        assert!(a.pending.lock().unwrap().is_empty());
    }
}
