//! Prefix tree of key bindings.

use std::collections::HashMap;

use chordex_common::ParseError;
use chordex_config::ConfigSource;
use tracing::{debug, warn};

use crate::chord::parse_chord;
use crate::key::KeyEvent;

/// A complete key sequence and the ex string it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyEvent>,
    pub exstr: String,
}

impl Binding {
    pub fn mapstr(&self) -> String {
        self.keys.iter().map(KeyEvent::to_mapstr).collect()
    }
}

/// A node is a prefix of longer bindings, a terminal binding, or both.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    command: Option<String>,
    children: HashMap<KeyEvent, TrieNode>,
}

impl TrieNode {
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn children(&self) -> &HashMap<KeyEvent, TrieNode> {
        &self.children
    }

    /// Every binding at or below this node, keys relative to it.
    pub fn bindings(&self) -> Vec<Binding> {
        let mut out = Vec::new();
        self.collect(&mut Vec::new(), &mut out);
        out.sort_by_key(Binding::mapstr);
        out
    }

    fn collect(&self, path: &mut Vec<KeyEvent>, out: &mut Vec<Binding>) {
        if let Some(exstr) = &self.command {
            out.push(Binding {
                keys: path.clone(),
                exstr: exstr.clone(),
            });
        }
        for (key, child) in &self.children {
            path.push(key.clone());
            child.collect(path, out);
            path.pop();
        }
    }
}

/// Bindings for one mode. The root is never terminal.
#[derive(Debug, Clone, Default)]
pub struct KeyTrie {
    root: TrieNode,
    len: usize,
}

impl KeyTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the trie for `map_name` from a binding source.
    ///
    /// Chords with no keys are logged as warnings and skipped. An empty ex
    /// string leaves the chord unbound.
    pub fn from_source(source: &dyn ConfigSource, map_name: &str) -> Self {
        let mut trie = Self::new();
        for chord in source.chords(map_name) {
            let Some(exstr) = source.get(map_name, &chord) else {
                continue;
            };
            if exstr.trim().is_empty() {
                continue;
            }
            match parse_chord(&chord).and_then(|keys| trie.insert(&keys, exstr)) {
                Ok(Some(previous)) => {
                    warn!("{map_name}: chord '{chord}' rebinds an existing sequence (was '{previous}')");
                }
                Ok(None) => {}
                Err(e) => warn!("{map_name}: invalid chord '{chord}': {e}"),
            }
        }
        debug!(map = map_name, bindings = trie.len(), "built key trie");
        trie
    }

    /// Bind `keys` to `exstr`, returning the ex string it replaced.
    pub fn insert(
        &mut self,
        keys: &[KeyEvent],
        exstr: impl Into<String>,
    ) -> Result<Option<String>, ParseError> {
        if keys.is_empty() {
            return Err(ParseError::Grammar("cannot bind an empty key sequence".into()));
        }
        let mut node = &mut self.root;
        for key in keys {
            node = node.children.entry(key.clone()).or_default();
        }
        let previous = node.command.replace(exstr.into());
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// The node reached by following `keys` from the root.
    pub fn lookup(&self, keys: &[KeyEvent]) -> Option<&TrieNode> {
        keys.iter()
            .try_fold(&self.root, |node, key| node.children.get(key))
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.root.bindings()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
