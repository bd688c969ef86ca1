//! Key sequences: canonical key events, chord strings, binding tries, and
//! the live matcher that turns key presses into ex strings.

pub mod chord;
pub mod key;
pub mod matcher;
pub mod mode;
pub mod trie;

pub use chord::parse_chord;
pub use key::KeyEvent;
pub use matcher::{Candidate, MatchResult, Matcher, NextStep};
pub use mode::Mode;
pub use trie::{Binding, KeyTrie, TrieNode};
