//! Realm identity: who sent a message and where a message should go.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tab identifiers follow the browser convention: `-1` means "not a tab".
pub type TabId = i32;

pub const TAB_ID_NONE: TabId = -1;

/// Which kind of isolated execution context a realm is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealmKind {
    /// The privileged, UI-less realm.
    Coordinator,
    /// A UI surface: a tab's top frame or an embedded frame.
    Tab,
}

/// Addressing information for one realm.
///
/// Every field is always present on the wire: the coordinator carries
/// `tab_id = -1` and `frame_id = 0`, top-level tab frames carry `frame_id = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextIdentity {
    pub realm_kind: RealmKind,
    pub tab_id: TabId,
    pub frame_id: u32,
}

impl ContextIdentity {
    pub const fn coordinator() -> Self {
        Self {
            realm_kind: RealmKind::Coordinator,
            tab_id: TAB_ID_NONE,
            frame_id: 0,
        }
    }

    pub const fn tab(tab_id: TabId) -> Self {
        Self::frame(tab_id, 0)
    }

    pub const fn frame(tab_id: TabId, frame_id: u32) -> Self {
        Self {
            realm_kind: RealmKind::Tab,
            tab_id,
            frame_id,
        }
    }

    pub fn is_coordinator(&self) -> bool {
        self.realm_kind == RealmKind::Coordinator
    }

    pub fn is_top_frame(&self) -> bool {
        self.realm_kind == RealmKind::Tab && self.frame_id == 0
    }

    /// The top frame of the tab this realm lives in, or `None` for the coordinator.
    pub fn owning_tab(&self) -> Option<ContextIdentity> {
        match self.realm_kind {
            RealmKind::Coordinator => None,
            RealmKind::Tab => Some(Self::tab(self.tab_id)),
        }
    }
}

impl fmt::Display for ContextIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.realm_kind {
            RealmKind::Coordinator => write!(f, "coordinator"),
            RealmKind::Tab if self.frame_id == 0 => write!(f, "tab:{}", self.tab_id),
            RealmKind::Tab => write!(f, "tab:{}/frame:{}", self.tab_id, self.frame_id),
        }
    }
}
