//! Interactive loop: stdin lines become key chords or ex strings for the
//! active tab.

use std::sync::Arc;
use std::time::Instant;

use chordex_dispatch::Outcome;
use chordex_keys::{parse_chord, Candidate, MatchResult, NextStep};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::boot::Session;

/// Read stdin until EOF. While a key sequence is pending the idle timeout
/// is enforced even if no further line arrives.
pub async fn run(session: &mut Session) -> chordex_common::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("reading chords from stdin (prefix ex commands with ':')");

    loop {
        let deadline = match session.active_tab().await {
            Some(tab) => tab.matcher.deadline(),
            None => None,
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed");
                    return Ok(());
                };
                for out in handle_line(session, &line).await {
                    println!("{out}");
                }
            }
            _ = sleep_until(deadline) => {
                expire_all(session, Instant::now());
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn expire_all(session: &mut Session, now: Instant) {
    for (tab_id, tab) in session.tabs.iter_mut() {
        if tab.matcher.expire(now) {
            debug!(tab_id, "pending keys dropped");
        }
    }
}

/// Handle one input line and return what should be shown for it.
pub async fn handle_line(session: &mut Session, line: &str) -> Vec<String> {
    if let Some(exstr) = line.strip_prefix(':') {
        return match session.active_tab().await {
            Some(tab) => {
                let dispatcher = Arc::clone(&tab.dispatcher);
                vec![describe(&dispatcher.accept_ex_cmd(exstr).await)]
            }
            None => vec!["no active tab".to_string()],
        };
    }
    if line.trim().is_empty() {
        return Vec::new();
    }

    let keys = match parse_chord(line) {
        Ok(keys) => keys,
        Err(e) => {
            warn!(line, "bad chord: {e}");
            return vec![format!("bad chord: {e}")];
        }
    };

    let mut out = Vec::new();
    for key in keys {
        // Re-resolved per key: a binding may have moved focus.
        let Some(tab) = session.active_tab().await else {
            out.push("no active tab".to_string());
            break;
        };
        let mode = tab.mode();
        match tab.matcher.feed(key.clone(), mode) {
            MatchResult::Matched(exstr) => {
                let dispatcher = Arc::clone(&tab.dispatcher);
                out.push(describe(&dispatcher.accept_ex_cmd(&exstr).await));
            }
            MatchResult::Pending(candidates) => {
                out.extend(which_key(&tab.matcher.pending_mapstr(), &candidates));
            }
            MatchResult::NoMatch => {
                debug!(key = %key, %mode, "unbound key");
            }
        }
    }
    out
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Executed(value) => format!("=> {value}"),
        Outcome::ParseFailed(e) => format!("parse error: {e}"),
        Outcome::ExecutionFailed(e) => format!("error: {e}"),
    }
}

fn which_key(prefix: &str, candidates: &[Candidate]) -> Vec<String> {
    let mut out = vec![format!("{prefix} ...")];
    out.extend(candidates.iter().map(|c| match &c.next {
        NextStep::Command(exstr) => format!("  {:<12} {exstr}", c.key.to_mapstr()),
        NextStep::Submap(bindings) => {
            format!("  {:<12} +{} bindings", c.key.to_mapstr(), bindings.len())
        }
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::boot;
    use chordex_config::ChordexConfig;
    use chordex_keys::Mode;
    use std::time::Duration;

    async fn session() -> Session {
        let mut config = ChordexConfig::default();
        config.bus.broadcast_timeout_ms = 200;
        config.lock.poll_interval_ms = 10;
        boot(&config, 2).await
    }

    #[tokio::test]
    async fn colon_lines_are_ex_commands() {
        let mut session = session().await;
        assert_eq!(
            handle_line(&mut session, ":echo hello there").await,
            vec![r#"=> "hello there""#]
        );
        let out = handle_line(&mut session, ":nosuchthing").await;
        assert!(out[0].starts_with("parse error:"), "{out:?}");
    }

    #[tokio::test]
    async fn pending_prefix_lists_candidates() {
        let mut session = session().await;
        let out = handle_line(&mut session, "g").await;
        assert_eq!(out[0], "g ...");
        assert!(out.iter().any(|l| l.contains("echo top")), "{out:?}");

        let out = handle_line(&mut session, "g").await;
        assert_eq!(out, vec![r#"=> "top""#]);
    }

    #[tokio::test]
    async fn whole_sequence_on_one_line() {
        let mut session = session().await;
        assert_eq!(handle_line(&mut session, "gg").await, vec![r#"=> "top""#]);
    }

    #[tokio::test]
    async fn mode_switch_changes_active_map() {
        let mut session = session().await;
        handle_line(&mut session, "i").await;
        assert_eq!(session.tabs[&1].mode(), Mode::Insert);

        // `gg` is not bound in insert mode.
        assert!(handle_line(&mut session, "gg").await.is_empty());

        handle_line(&mut session, "<Esc>").await;
        assert_eq!(session.tabs[&1].mode(), Mode::Normal);
    }

    #[tokio::test]
    async fn focus_follows_bindings() {
        let mut session = session().await;
        handle_line(&mut session, "<A-2>i").await;
        assert_eq!(session.tabs[&1].mode(), Mode::Normal);
        assert_eq!(session.tabs[&2].mode(), Mode::Insert);
    }

    #[tokio::test]
    async fn repeat_binding_reruns_last_command() {
        let mut session = session().await;
        handle_line(&mut session, ":echo again").await;
        assert_eq!(handle_line(&mut session, ".").await, vec!["=> 1"]);
    }

    #[tokio::test]
    async fn count_prefix_reaches_the_command() {
        let mut session = session().await;
        handle_line(&mut session, ":echo again").await;
        let out = handle_line(&mut session, "2.").await;
        assert_eq!(out.last().map(String::as_str), Some("=> 2"), "{out:?}");
    }

    #[tokio::test]
    async fn expire_drops_stale_prefix() {
        let mut session = session().await;
        handle_line(&mut session, "g").await;
        let later = Instant::now() + Duration::from_secs(5);
        expire_all(&mut session, later);
        assert!(session.tabs[&1].matcher.pending().is_empty());
    }
}
