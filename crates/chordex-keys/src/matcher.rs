//! Live key-sequence matcher.
//!
//! Keys accumulate into a sequence that is walked through the current
//! mode's trie. The sequence resets on a terminal match, on a key with no
//! edge, on a mode change, and after the idle timeout.
//!
//! A node that is both terminal and a prefix matches immediately: with
//! `g` and `gg` bound, `g` always wins.
//!
//! In normal mode a sequence may start with a count: unmodified digits,
//! the first one nonzero. The count stays pending with the sequence and is
//! appended to the matched ex string, so `3j` bound through `j` runs
//! `scrollline 3`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chordex_config::ConfigSource;
use tracing::debug;

use crate::key::KeyEvent;
use crate::mode::Mode;
use crate::trie::{Binding, KeyTrie, TrieNode};

/// Where pressing a candidate key next would lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// The key completes a binding.
    Command(String),
    /// The key is a further prefix; these bindings lie below it.
    Submap(Vec<Binding>),
}

/// One possible next key while a sequence is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: KeyEvent,
    pub next: NextStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Nothing is pending.
    NoMatch,
    /// The sequence so far is a proper prefix.
    Pending(Vec<Candidate>),
    /// A binding was completed.
    Matched(String),
}

pub struct Matcher {
    tries: HashMap<Mode, KeyTrie>,
    timeout: Duration,
    sequence: Vec<KeyEvent>,
    sequence_mode: Mode,
    /// Digits of a count typed before the sequence.
    count: String,
    last_key_at: Option<Instant>,
}

impl Matcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tries: HashMap::new(),
            timeout,
            sequence: Vec::new(),
            sequence_mode: Mode::Normal,
            count: String::new(),
            last_key_at: None,
        }
    }

    /// Build one trie per mode from the binding source.
    pub fn from_source(source: &dyn ConfigSource, timeout: Duration) -> Self {
        let mut matcher = Self::new(timeout);
        for mode in Mode::ALL {
            matcher.set_trie(mode, KeyTrie::from_source(source, mode.map_name()));
        }
        matcher
    }

    pub fn set_trie(&mut self, mode: Mode, trie: KeyTrie) {
        self.tries.insert(mode, trie);
        self.reset();
    }

    pub fn trie(&self, mode: Mode) -> Option<&KeyTrie> {
        self.tries.get(&mode)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn feed(&mut self, event: KeyEvent, mode: Mode) -> MatchResult {
        self.feed_at(event, mode, Instant::now())
    }

    /// [`Matcher::feed`] with an explicit arrival time.
    pub fn feed_at(&mut self, event: KeyEvent, mode: Mode, now: Instant) -> MatchResult {
        self.expire(now);
        if mode != self.sequence_mode {
            self.reset();
            self.sequence_mode = mode;
        }

        if event.is_modifier_only() {
            return self.current();
        }

        if mode == Mode::Normal && self.sequence.is_empty() && self.extends_count(&event) {
            self.count.push_str(&event.key);
            self.last_key_at = Some(now);
            return self.current();
        }

        self.sequence.push(event);
        self.last_key_at = Some(now);

        let Some(trie) = self.tries.get(&mode) else {
            self.reset();
            return MatchResult::NoMatch;
        };

        match trie.lookup(&self.sequence) {
            None => {
                debug!(keys = %self.pending_mapstr(), %mode, "no binding");
                self.reset();
                MatchResult::NoMatch
            }
            Some(node) => match node.command() {
                Some(exstr) => {
                    let exstr = if self.count.is_empty() {
                        exstr.to_string()
                    } else {
                        format!("{exstr} {}", self.count)
                    };
                    debug!(keys = %self.pending_mapstr(), %mode, exstr = %exstr, "matched");
                    self.reset();
                    MatchResult::Matched(exstr)
                }
                None => MatchResult::Pending(candidates(node)),
            },
        }
    }

    fn extends_count(&self, event: &KeyEvent) -> bool {
        if event.mods != 0 {
            return false;
        }
        let mut chars = event.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => c != '0' || !self.count.is_empty(),
            _ => false,
        }
    }

    /// The current state without feeding anything.
    fn current(&self) -> MatchResult {
        if self.sequence.is_empty() && self.count.is_empty() {
            return MatchResult::NoMatch;
        }
        self.tries
            .get(&self.sequence_mode)
            .and_then(|trie| trie.lookup(&self.sequence))
            .map(|node| MatchResult::Pending(candidates(node)))
            .unwrap_or(MatchResult::NoMatch)
    }

    /// When the pending sequence times out, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        if self.sequence.is_empty() && self.count.is_empty() {
            return None;
        }
        self.last_key_at.map(|at| at + self.timeout)
    }

    /// Drop the pending sequence if its deadline has passed. Returns whether
    /// anything was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                debug!(keys = %self.pending_mapstr(), "key sequence timed out");
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.sequence.clear();
        self.count.clear();
        self.last_key_at = None;
    }

    pub fn pending(&self) -> &[KeyEvent] {
        &self.sequence
    }

    /// The pending count, if one was typed and fits in a `u32`.
    pub fn count(&self) -> Option<u32> {
        self.count.parse().ok()
    }

    /// Count and keys typed so far, as a chord string.
    pub fn pending_mapstr(&self) -> String {
        let keys: String = self.sequence.iter().map(KeyEvent::to_mapstr).collect();
        format!("{}{keys}", self.count)
    }
}

fn candidates(node: &TrieNode) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = node
        .children()
        .iter()
        .map(|(key, child)| Candidate {
            key: key.clone(),
            next: match child.command() {
                Some(exstr) => NextStep::Command(exstr.to_string()),
                None => NextStep::Submap(child.bindings()),
            },
        })
        .collect();
    out.sort_by(|a, b| a.key.to_mapstr().cmp(&b.key.to_mapstr()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::parse_chord;

    fn matcher(bindings: &[(&str, &str)]) -> Matcher {
        let mut trie = KeyTrie::new();
        for (chord, exstr) in bindings {
            trie.insert(&parse_chord(chord).unwrap(), *exstr).unwrap();
        }
        let mut m = Matcher::new(Duration::from_millis(1000));
        m.set_trie(Mode::Normal, trie);
        m
    }

    fn key(k: &str) -> KeyEvent {
        KeyEvent::plain(k)
    }

    #[test]
    fn first_match_wins_over_longer_binding() {
        let mut m = matcher(&[("g", "A"), ("g g", "B")]);
        assert_eq!(m.feed(key("g"), Mode::Normal), MatchResult::Matched("A".into()));
        // The sequence reset, so the second g starts over and matches again.
        assert_eq!(m.feed(key("g"), Mode::Normal), MatchResult::Matched("A".into()));
    }

    #[test]
    fn every_proper_prefix_is_pending() {
        let mut m = matcher(&[("<C-x>ab", "deep"), ("<C-x>c", "shallow")]);
        let keys = parse_chord("<C-x>ab").unwrap();

        match m.feed(keys[0].clone(), Mode::Normal) {
            MatchResult::Pending(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].key, key("a"));
                assert!(matches!(&candidates[0].next, NextStep::Submap(b) if b.len() == 1));
                assert_eq!(candidates[1].next, NextStep::Command("shallow".into()));
            }
            other => panic!("expected pending, got {other:?}"),
        }
        assert!(matches!(m.feed(keys[1].clone(), Mode::Normal), MatchResult::Pending(_)));
        assert_eq!(
            m.feed(keys[2].clone(), Mode::Normal),
            MatchResult::Matched("deep".into())
        );
        assert!(m.pending().is_empty());
    }

    #[test]
    fn unmatched_key_resets() {
        let mut m = matcher(&[("gt", "next")]);
        assert!(matches!(m.feed(key("g"), Mode::Normal), MatchResult::Pending(_)));
        assert_eq!(m.feed(key("x"), Mode::Normal), MatchResult::NoMatch);
        assert!(m.pending().is_empty());
        assert!(matches!(m.feed(key("g"), Mode::Normal), MatchResult::Pending(_)));
    }

    #[test]
    fn idle_timeout_resets() {
        let mut m = matcher(&[("gt", "next")]);
        let start = Instant::now();
        assert!(matches!(
            m.feed_at(key("g"), Mode::Normal, start),
            MatchResult::Pending(_)
        ));
        assert_eq!(m.deadline(), Some(start + Duration::from_millis(1000)));

        let late = start + Duration::from_millis(1500);
        assert_eq!(m.feed_at(key("t"), Mode::Normal, late), MatchResult::NoMatch);
        assert!(m.pending().is_empty());
    }

    #[test]
    fn expire_only_after_deadline() {
        let mut m = matcher(&[("gt", "next")]);
        let start = Instant::now();
        m.feed_at(key("g"), Mode::Normal, start);
        assert!(!m.expire(start + Duration::from_millis(999)));
        assert!(m.expire(start + Duration::from_millis(1000)));
        assert_eq!(m.deadline(), None);
    }

    #[test]
    fn modes_use_separate_tries() {
        let mut m = matcher(&[("gt", "next")]);
        let mut insert = KeyTrie::new();
        insert.insert(&[key("Escape")], "mode normal").unwrap();
        m.set_trie(Mode::Insert, insert);

        assert_eq!(m.feed(key("g"), Mode::Insert), MatchResult::NoMatch);
        assert_eq!(
            m.feed(key("Escape"), Mode::Insert),
            MatchResult::Matched("mode normal".into())
        );
    }

    #[test]
    fn mode_change_drops_pending_sequence() {
        let mut m = matcher(&[("gt", "next")]);
        m.set_trie(Mode::Insert, KeyTrie::new());
        m.feed(key("g"), Mode::Normal);
        m.feed(key("t"), Mode::Insert);
        assert_eq!(m.feed(key("t"), Mode::Normal), MatchResult::NoMatch);
    }

    #[test]
    fn modifier_presses_do_not_break_a_sequence() {
        let mut m = matcher(&[("gT", "prev")]);
        m.feed(key("g"), Mode::Normal);
        assert!(matches!(m.feed(key("Shift"), Mode::Normal), MatchResult::Pending(_)));
        assert_eq!(
            m.feed(KeyEvent::from_raw(false, false, false, true, "T"), Mode::Normal),
            MatchResult::Matched("prev".into())
        );
    }

    #[test]
    fn built_from_config() {
        let config = chordex_config::ChordexConfig::default();
        let mut m = Matcher::from_source(&config, Duration::from_millis(1000));
        assert_eq!(m.feed(key("."), Mode::Normal), MatchResult::Matched("repeat".into()));
        assert_eq!(
            m.feed(key("Escape"), Mode::Insert),
            MatchResult::Matched("mode normal".into())
        );
    }

    #[test]
    fn count_is_appended_to_the_match() {
        let mut m = matcher(&[("j", "scrollline"), ("g g", "top")]);
        assert!(matches!(m.feed(key("3"), Mode::Normal), MatchResult::Pending(_)));
        assert_eq!(m.count(), Some(3));
        assert_eq!(
            m.feed(key("j"), Mode::Normal),
            MatchResult::Matched("scrollline 3".into())
        );
        assert_eq!(m.count(), None);

        for k in ["1", "0", "g"] {
            assert!(matches!(m.feed(key(k), Mode::Normal), MatchResult::Pending(_)));
        }
        assert_eq!(m.pending_mapstr(), "10g");
        assert_eq!(m.feed(key("g"), Mode::Normal), MatchResult::Matched("top 10".into()));
    }

    #[test]
    fn zero_only_continues_a_count() {
        let mut m = matcher(&[("0", "start"), ("j", "scrollline")]);
        assert_eq!(m.feed(key("0"), Mode::Normal), MatchResult::Matched("start".into()));
        m.feed(key("2"), Mode::Normal);
        m.feed(key("0"), Mode::Normal);
        assert_eq!(
            m.feed(key("j"), Mode::Normal),
            MatchResult::Matched("scrollline 20".into())
        );
    }

    #[test]
    fn unbound_key_after_count_drops_both() {
        let mut m = matcher(&[("j", "scrollline")]);
        m.feed(key("3"), Mode::Normal);
        assert_eq!(m.feed(key("x"), Mode::Normal), MatchResult::NoMatch);
        assert_eq!(m.count(), None);
        assert_eq!(m.pending_mapstr(), "");
        assert_eq!(m.feed(key("j"), Mode::Normal), MatchResult::Matched("scrollline".into()));
    }

    #[test]
    fn count_alone_times_out() {
        let mut m = matcher(&[("j", "scrollline")]);
        let start = Instant::now();
        m.feed_at(key("5"), Mode::Normal, start);
        assert_eq!(m.deadline(), Some(start + Duration::from_millis(1000)));
        assert!(m.expire(start + Duration::from_millis(1000)));
        assert_eq!(m.count(), None);
    }

    #[test]
    fn modified_digits_and_other_modes_are_not_counts() {
        let mut m = matcher(&[("<A-1>", "tabfocus 1")]);
        let alt_one = KeyEvent::from_raw(true, false, false, false, "1");
        assert_eq!(
            m.feed(alt_one, Mode::Normal),
            MatchResult::Matched("tabfocus 1".into())
        );

        let mut insert = KeyTrie::new();
        insert.insert(&[key("Escape")], "mode normal").unwrap();
        m.set_trie(Mode::Insert, insert);
        assert_eq!(m.feed(key("3"), Mode::Insert), MatchResult::NoMatch);
        assert_eq!(m.count(), None);
    }
}
