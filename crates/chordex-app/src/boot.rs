//! Startup: one coordinator and N tab realms on a shared router.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chordex_bus::{Realm, Router};
use chordex_common::{clamp, ConfigError, ContextIdentity, TabId};
use chordex_config::{load_rc, rc::default_rc_path, ChordexConfig};
use chordex_dispatch::{Dispatcher, Outcome};
use chordex_keys::{Matcher, Mode};
use chordex_lock::LockManager;
use tracing::{info, warn};

use crate::commands::{catalog, ModeState};

const MAX_TABS: u32 = 64;

/// Everything a tab's key loop needs.
pub struct TabHandle {
    pub dispatcher: Arc<Dispatcher>,
    pub mode: ModeState,
    pub matcher: Matcher,
}

impl TabHandle {
    pub fn mode(&self) -> Mode {
        self.mode.lock().map(|m| *m).unwrap_or_default()
    }
}

pub struct Session {
    pub router: Router,
    pub coordinator: Arc<Dispatcher>,
    pub tabs: BTreeMap<TabId, TabHandle>,
}

impl Session {
    /// The focused tab, if any is registered.
    pub async fn active_tab(&mut self) -> Option<&mut TabHandle> {
        let active = self.router.active().await?;
        self.tabs.get_mut(&active.tab_id)
    }
}

pub async fn boot(config: &ChordexConfig, tabs: u32) -> Session {
    let router = Router::new();
    let broadcast_timeout = Duration::from_millis(config.bus.broadcast_timeout_ms);
    let poll_interval = Duration::from_millis(config.lock.poll_interval_ms);
    let key_timeout = Duration::from_millis(config.keys.timeout_ms);

    let coordinator = {
        let realm = Realm::spawn(ContextIdentity::coordinator(), router.clone(), broadcast_timeout).await;
        let locks = LockManager::install(Arc::clone(&realm), poll_interval);
        Dispatcher::install(realm, catalog(locks, None), config.aliases.clone())
    };

    let mut handles = BTreeMap::new();
    for tab_id in 1..=clamp(tabs, 1, MAX_TABS) as TabId {
        let realm = Realm::spawn(ContextIdentity::tab(tab_id), router.clone(), broadcast_timeout).await;
        let locks = LockManager::install(Arc::clone(&realm), poll_interval);
        let mode: ModeState = Arc::new(Mutex::new(Mode::Normal));
        let dispatcher = Dispatcher::install(
            realm,
            catalog(locks, Some(Arc::clone(&mode))),
            config.aliases.clone(),
        );
        handles.insert(
            tab_id,
            TabHandle {
                dispatcher,
                mode,
                matcher: Matcher::from_source(config, key_timeout),
            },
        );
    }

    info!(
        tabs = handles.len(),
        commands = coordinator.registry().len(),
        "realms started"
    );
    Session {
        router,
        coordinator,
        tabs: handles,
    }
}

/// Pick the rc file: `--rc`, then `[rc] path`, then `chordexrc` in the
/// config directory if it exists.
pub fn rc_path(cli: Option<&Path>, config: &ChordexConfig) -> Option<PathBuf> {
    if let Some(path) = cli.or(config.rc.path.as_deref()) {
        return Some(path.to_path_buf());
    }
    default_rc_path().ok().filter(|path| path.exists())
}

/// Run every rc line through the coordinator's dispatcher, in order.
pub async fn run_rc(coordinator: &Dispatcher, path: &Path) -> Result<usize, ConfigError> {
    let cmds = load_rc(path)?;
    let mut failed = 0;
    for cmd in &cmds {
        if !matches!(coordinator.accept_ex_cmd(cmd).await, Outcome::Executed(_)) {
            failed += 1;
        }
    }
    if failed > 0 {
        warn!(path = %path.display(), failed, "some rc commands failed");
    }
    info!(path = %path.display(), count = cmds.len(), "rc file done");
    Ok(cmds.len())
}
