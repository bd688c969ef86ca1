//! The transport fabric: maps realm identities to inbox senders.

use std::collections::HashMap;
use std::sync::Arc;

use chordex_common::{BusError, ContextIdentity, TabId};
use tokio::sync::{mpsc, RwLock};

use crate::envelope::Envelope;

struct RouterState {
    realms: HashMap<ContextIdentity, mpsc::Sender<String>>,
    active_tab: Option<TabId>,
}

/// Thread-safe realm registry, shared by every realm on one bus.
#[derive(Clone)]
pub struct Router {
    state: Arc<RwLock<RouterState>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RouterState {
                realms: HashMap::new(),
                active_tab: None,
            })),
        }
    }

    /// Register a realm's inbox. Returns the sender it replaced, if any.
    ///
    /// The first top-level tab to register becomes the active one.
    pub async fn register(
        &self,
        id: ContextIdentity,
        tx: mpsc::Sender<String>,
    ) -> Option<mpsc::Sender<String>> {
        let mut state = self.state.write().await;
        if id.is_top_frame() && state.active_tab.is_none() {
            state.active_tab = Some(id.tab_id);
        }
        state.realms.insert(id, tx)
    }

    /// Remove a realm. Returns true if it was registered.
    pub async fn unregister(&self, id: &ContextIdentity) -> bool {
        let mut state = self.state.write().await;
        let removed = state.realms.remove(id).is_some();
        if id.is_top_frame() && state.active_tab == Some(id.tab_id) {
            state.active_tab = None;
        }
        removed
    }

    /// Serialize and deliver an envelope to one realm.
    pub async fn deliver(&self, to: &ContextIdentity, envelope: &Envelope) -> Result<(), BusError> {
        let raw = envelope.encode()?;
        let tx = self
            .state
            .read()
            .await
            .realms
            .get(to)
            .cloned()
            .ok_or_else(|| BusError::Unreachable(to.to_string()))?;
        tx.send(raw)
            .await
            .map_err(|_| BusError::Unreachable(to.to_string()))
    }

    /// Every registered realm, coordinator first, then tabs in id order.
    pub async fn realms(&self) -> Vec<ContextIdentity> {
        let mut ids: Vec<ContextIdentity> = self.state.read().await.realms.keys().copied().collect();
        ids.sort_by_key(|id| (!id.is_coordinator(), id.tab_id, id.frame_id));
        ids
    }

    pub async fn contains(&self, id: &ContextIdentity) -> bool {
        self.state.read().await.realms.contains_key(id)
    }

    /// Make a registered tab the active one.
    pub async fn focus(&self, tab_id: TabId) -> Result<(), BusError> {
        let mut state = self.state.write().await;
        let top = ContextIdentity::tab(tab_id);
        if !state.realms.contains_key(&top) {
            return Err(BusError::Unreachable(top.to_string()));
        }
        state.active_tab = Some(tab_id);
        tracing::debug!(tab = tab_id, "focused tab");
        Ok(())
    }

    /// The focused tab's top frame.
    pub async fn active(&self) -> Option<ContextIdentity> {
        self.state.read().await.active_tab.map(ContextIdentity::tab)
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.realms.len()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
