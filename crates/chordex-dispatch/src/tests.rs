//! Dispatcher behaviour across one or more realms.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chordex_bus::{Realm, Router};
use chordex_common::{BusError, CommandError, ContextIdentity, ParseError};
use serde_json::{json, Value};

use crate::*;

/// Counts runs and records the arguments of the last one.
#[derive(Default)]
struct Counter {
    runs: AtomicUsize,
    last_args: Mutex<Vec<Value>>,
}

impl Counter {
    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Command for Counter {
    async fn run(&self, _ctx: &Dispatcher, args: Vec<Value>) -> Result<Value, CommandError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = args;
        Ok(json!(self.runs()))
    }
}

struct Failing;

#[async_trait]
impl Command for Failing {
    async fn run(&self, _ctx: &Dispatcher, _args: Vec<Value>) -> Result<Value, CommandError> {
        Err(CommandError::Failed("boom".into()))
    }
}

struct Fixture {
    counter: Arc<Counter>,
    registry: Registry,
}

fn fixture(placement: Placement) -> Fixture {
    let counter = Arc::new(Counter::default());
    let mut registry = Registry::new();
    registry
        .register("cmdA", placement, &[ParamType::Number, ParamType::String], counter.clone())
        .register("fail", Placement::Anywhere, &[], Arc::new(Failing))
        .register(REPEAT_COMMAND, Placement::Anywhere, Repeat::PARAMS, Arc::new(Repeat));
    Fixture { counter, registry }
}

async fn dispatcher(router: &Router, id: ContextIdentity, fx: &Fixture) -> Arc<Dispatcher> {
    let realm = Realm::spawn(id, router.clone(), Duration::from_millis(200)).await;
    let aliases: BTreeMap<String, String> = [("a", "cmdA"), ("again", "repeat")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Dispatcher::install(realm, fx.registry.clone(), aliases)
}

async fn single() -> (Arc<Dispatcher>, Arc<Counter>) {
    let fx = fixture(Placement::Anywhere);
    let d = dispatcher(&Router::new(), ContextIdentity::tab(1), &fx).await;
    (d, fx.counter)
}

#[tokio::test]
async fn repeat_reruns_last_command_without_becoming_it() {
    let (d, counter) = single().await;

    assert!(d.accept_ex_cmd("cmdA").await.is_executed());
    assert_eq!(d.last_command().as_deref(), Some("cmdA"));

    d.accept_ex_cmd("repeat").await;
    d.accept_ex_cmd("repeat").await;
    assert_eq!(counter.runs(), 3);
    assert_eq!(d.last_command().as_deref(), Some("cmdA"));
}

#[tokio::test]
async fn repeat_count_and_explicit_exstr() {
    let (d, counter) = single().await;

    let outcome = d.accept_ex_cmd("repeat 3 cmdA 1 x").await;
    assert_eq!(outcome, Outcome::Executed(json!(3)));
    assert_eq!(counter.runs(), 3);
    assert_eq!(*counter.last_args.lock().unwrap(), vec![json!(1), json!("x")]);
    assert_eq!(d.last_command().as_deref(), Some("cmdA 1 x"));
}

#[tokio::test]
async fn repeat_zero_runs_nothing() {
    let (d, counter) = single().await;
    assert_eq!(d.accept_ex_cmd("repeat 0 cmdA").await, Outcome::Executed(json!(0)));
    assert_eq!(counter.runs(), 0);

    d.accept_ex_cmd("cmdA").await;
    assert_eq!(d.accept_ex_cmd("repeat 0").await, Outcome::Executed(json!(0)));
    assert_eq!(counter.runs(), 1);
}

#[tokio::test]
async fn repeat_through_alias_does_not_touch_memo() {
    let (d, counter) = single().await;
    d.accept_ex_cmd("a").await;
    d.accept_ex_cmd("again 2").await;
    assert_eq!(counter.runs(), 3);
    assert_eq!(d.last_command().as_deref(), Some("a"));
}

#[tokio::test]
async fn repeat_with_empty_memo_fails_cleanly() {
    let (d, _) = single().await;
    let outcome = d.accept_ex_cmd("repeat").await;
    assert!(matches!(outcome, Outcome::ExecutionFailed(CommandError::Failed(_))));
    assert_eq!(d.last_command(), None);
}

#[tokio::test]
async fn parse_failure_leaves_memo_untouched() {
    let (d, counter) = single().await;
    d.accept_ex_cmd("cmdA").await;

    for bad in ["", "5 cmdA", "nosuchcommand", "cmdA notanumber"] {
        let outcome = d.accept_ex_cmd(bad).await;
        assert!(matches!(outcome, Outcome::ParseFailed(_)), "{bad:?} -> {outcome:?}");
    }
    assert_eq!(d.last_command().as_deref(), Some("cmdA"));
    assert_eq!(counter.runs(), 1);
}

#[tokio::test]
async fn unknown_command_is_named() {
    let (d, _) = single().await;
    assert_eq!(
        d.accept_ex_cmd("frobnicate 1").await,
        Outcome::ParseFailed(ParseError::UnknownCommand("frobnicate".into()))
    );
}

#[tokio::test]
async fn execution_failure_is_contained_and_remembered() {
    let (d, _) = single().await;
    let outcome = d.accept_ex_cmd("fail").await;
    assert_eq!(outcome, Outcome::ExecutionFailed(CommandError::Failed("boom".into())));
    assert_eq!(d.last_command().as_deref(), Some("fail"));
}

#[tokio::test]
async fn coordinator_command_is_forwarded_from_a_tab() {
    let router = Router::new();
    let fx = fixture(Placement::Coordinator);
    let coordinator = dispatcher(&router, ContextIdentity::coordinator(), &fx).await;
    let tab = dispatcher(&router, ContextIdentity::tab(1), &fx).await;

    let outcome = tab.accept_ex_cmd("cmdA 7 seven").await;
    assert_eq!(outcome, Outcome::Executed(json!(1)));
    assert_eq!(*fx.counter.last_args.lock().unwrap(), vec![json!(7), json!("seven")]);

    // The memo lives with the realm that accepted the string.
    assert_eq!(tab.last_command().as_deref(), Some("cmdA 7 seven"));
    assert_eq!(coordinator.last_command(), None);
}

#[tokio::test]
async fn ui_command_from_coordinator_goes_to_active_tab() {
    let router = Router::new();
    let coordinator_fx = fixture(Placement::Ui);
    let tab1_fx = fixture(Placement::Ui);
    let tab2_fx = fixture(Placement::Ui);
    let coordinator = dispatcher(&router, ContextIdentity::coordinator(), &coordinator_fx).await;
    let _tab1 = dispatcher(&router, ContextIdentity::tab(1), &tab1_fx).await;
    let _tab2 = dispatcher(&router, ContextIdentity::tab(2), &tab2_fx).await;
    router.focus(2).await.unwrap();

    assert!(coordinator.accept_ex_cmd("cmdA").await.is_executed());
    assert_eq!(coordinator_fx.counter.runs(), 0);
    assert_eq!(tab1_fx.counter.runs(), 0);
    assert_eq!(tab2_fx.counter.runs(), 1);
}

#[tokio::test]
async fn ui_command_from_frame_goes_to_own_tab() {
    let router = Router::new();
    let tab1_fx = fixture(Placement::Ui);
    let tab2_fx = fixture(Placement::Ui);
    let _tab1 = dispatcher(&router, ContextIdentity::tab(1), &tab1_fx).await;
    let _tab2 = dispatcher(&router, ContextIdentity::tab(2), &tab2_fx).await;
    let frame = dispatcher(&router, ContextIdentity::frame(2, 1), &fixture(Placement::Ui)).await;
    router.focus(1).await.unwrap();

    assert!(frame.accept_ex_cmd("cmdA").await.is_executed());
    assert_eq!(tab1_fx.counter.runs(), 0);
    assert_eq!(tab2_fx.counter.runs(), 1);
}

#[tokio::test]
async fn forwarding_to_missing_realm_is_an_execution_failure() {
    let router = Router::new();
    let fx = fixture(Placement::Coordinator);
    let tab = dispatcher(&router, ContextIdentity::tab(1), &fx).await;

    let outcome = tab.accept_ex_cmd("cmdA").await;
    assert_eq!(
        outcome,
        Outcome::ExecutionFailed(CommandError::Bus(BusError::Unreachable("coordinator".into())))
    );
}

#[tokio::test]
async fn run_refuses_commands_placed_elsewhere() {
    let (d, _) = {
        let fx = fixture(Placement::Coordinator);
        let d = dispatcher(&Router::new(), ContextIdentity::tab(1), &fx).await;
        (d, fx.counter)
    };
    assert_eq!(
        d.run("cmdA", vec![]).await,
        Err(CommandError::Unavailable("cmdA".into()))
    );
}

#[tokio::test]
async fn controller_channel_accepts_ex_strings_remotely() {
    let router = Router::new();
    let fx = fixture(Placement::Anywhere);
    let coordinator = dispatcher(&router, ContextIdentity::coordinator(), &fx).await;
    let tab = dispatcher(&router, ContextIdentity::tab(1), &fx).await;

    let reply = coordinator
        .realm()
        .call(tab.realm().id(), CONTROLLER_CHANNEL, "acceptExCmd", vec![json!("cmdA 2")])
        .await
        .unwrap();
    assert_eq!(reply["status"], "executed");
    assert_eq!(tab.last_command().as_deref(), Some("cmdA 2"));
    assert_eq!(coordinator.last_command(), None);

    let reply = coordinator
        .realm()
        .call(tab.realm().id(), CONTROLLER_CHANNEL, "acceptExCmd", vec![json!("nope")])
        .await
        .unwrap();
    assert_eq!(reply["status"], "parseFailed");
}
