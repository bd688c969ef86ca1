use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chordex_bus::{OperationView, Realm, Target};
use chordex_common::{CommandError, ParseError};
use chordex_config::expand_exstr;
use chordex_parser::parse_exstr;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::args::convert_args;
use crate::controller::{ControllerHandler, CONTROLLER_CHANNEL, CONTROLLER_METHODS};
use crate::registry::{Command, CommandSpec, Placement, Registry};
use crate::repeat::REPEAT_COMMAND;

/// Where a resolved command runs.
#[derive(Clone)]
pub enum Route {
    Local(Arc<dyn Command>),
    /// Run by the `controller` channel of another realm.
    Forward(Target),
}

/// A parsed ex string bound to a registered command.
#[derive(Clone)]
pub struct Resolved {
    pub name: String,
    pub args: Vec<Value>,
    pub route: Route,
}

/// What became of one ex string.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Executed(Value),
    /// Nothing ran and the last-command memo is unchanged.
    ParseFailed(ParseError),
    /// The command ran (or was sent) and failed.
    ExecutionFailed(CommandError),
}

impl Outcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed(_))
    }

    /// Wire form used by the `controller` channel.
    pub fn to_json(&self) -> Value {
        match self {
            Outcome::Executed(value) => json!({"status": "executed", "value": value}),
            Outcome::ParseFailed(e) => json!({"status": "parseFailed", "error": e.to_string()}),
            Outcome::ExecutionFailed(e) => {
                json!({"status": "executionFailed", "error": e.to_string()})
            }
        }
    }
}

/// One realm's dispatcher. Owns the realm's registry and last-command memo.
pub struct Dispatcher {
    realm: Arc<Realm>,
    registry: Registry,
    aliases: BTreeMap<String, String>,
    last_command: Mutex<Option<String>>,
    /// `controller` views for every target a forwarded route can name.
    forwarders: HashMap<Target, OperationView>,
}

/// Targets a [`Route::Forward`] can carry.
const FORWARD_TARGETS: [Target; 3] = [Target::Coordinator, Target::Active, Target::Own];

impl Dispatcher {
    /// Create the dispatcher and serve the `controller` channel on `realm`.
    pub fn install(
        realm: Arc<Realm>,
        registry: Registry,
        aliases: BTreeMap<String, String>,
    ) -> Arc<Self> {
        let forwarders = FORWARD_TARGETS
            .into_iter()
            .map(|target| {
                let view = OperationView::remote(
                    Arc::clone(&realm),
                    CONTROLLER_CHANNEL,
                    CONTROLLER_METHODS,
                    target,
                );
                (target, view)
            })
            .collect();
        let dispatcher = Arc::new(Self {
            realm: Arc::clone(&realm),
            registry,
            aliases,
            last_command: Mutex::new(None),
            forwarders,
        });
        realm.register_handler(
            CONTROLLER_CHANNEL,
            Arc::new(ControllerHandler::new(Arc::downgrade(&dispatcher))),
        );
        dispatcher
    }

    pub fn realm(&self) -> &Arc<Realm> {
        &self.realm
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn last_command(&self) -> Option<String> {
        self.last_command.lock().ok().and_then(|memo| memo.clone())
    }

    /// Expand aliases, parse, and resolve `raw` without running anything.
    pub fn resolve(&self, raw: &str) -> Result<Resolved, ParseError> {
        let expanded = expand_exstr(raw, &self.aliases)?;
        let ast = parse_exstr(&expanded)?;
        let spec = self
            .registry
            .get(&ast.command)
            .ok_or_else(|| ParseError::UnknownCommand(ast.command.clone()))?;
        let args = convert_args(&spec.name, &spec.params, ast.args)?;
        Ok(Resolved {
            name: spec.name.clone(),
            args,
            route: self.route(spec),
        })
    }

    /// Parse and run one ex string. Never fails: problems are logged and
    /// reported in the returned [`Outcome`].
    ///
    /// The memo is overwritten before the command runs, unless the command
    /// is `repeat`, so a failing command still counts as the last one.
    pub async fn accept_ex_cmd(&self, raw: &str) -> Outcome {
        let resolved = match self.resolve(raw) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(realm = %self.realm.id(), exstr = raw, error = %e, "could not parse ex command");
                return Outcome::ParseFailed(e);
            }
        };

        if resolved.name != REPEAT_COMMAND {
            if let Ok(mut memo) = self.last_command.lock() {
                *memo = Some(raw.to_string());
            }
        }

        debug!(realm = %self.realm.id(), exstr = raw, command = %resolved.name, "running ex command");
        match self.execute(resolved).await {
            Ok(value) => Outcome::Executed(value),
            Err(e) => {
                error!(realm = %self.realm.id(), exstr = raw, error = %e, "ex command failed");
                Outcome::ExecutionFailed(e)
            }
        }
    }

    /// Run a registered command in this realm, bypassing parsing and the
    /// memo. Fails if the command may not run here.
    pub async fn run(&self, name: &str, args: Vec<Value>) -> Result<Value, CommandError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| CommandError::Unavailable(name.to_string()))?;
        match self.route(spec) {
            Route::Local(command) => command.run(self, args).await,
            Route::Forward(_) => Err(CommandError::Unavailable(name.to_string())),
        }
    }

    async fn execute(&self, resolved: Resolved) -> Result<Value, CommandError> {
        match resolved.route {
            Route::Local(command) => command.run(self, resolved.args).await,
            Route::Forward(target) => {
                let mut args = Vec::with_capacity(resolved.args.len() + 1);
                args.push(Value::String(resolved.name));
                args.extend(resolved.args);
                let view = self
                    .forwarders
                    .get(&target)
                    .ok_or_else(|| CommandError::Unavailable(format!("no route to {target:?}")))?;
                Ok(view.call("run", args).await?)
            }
        }
    }

    fn route(&self, spec: &CommandSpec) -> Route {
        let here = self.realm.id();
        let local = || Route::Local(Arc::clone(&spec.command));
        match spec.placement {
            Placement::Anywhere => local(),
            Placement::Coordinator if here.is_coordinator() => local(),
            Placement::Coordinator => Route::Forward(Target::Coordinator),
            Placement::Ui if here.is_top_frame() => local(),
            Placement::Ui if here.is_coordinator() => Route::Forward(Target::Active),
            Placement::Ui => Route::Forward(Target::Own),
        }
    }
}
