//! Routing of symbolic command names to local handlers.
//!
//! Two tables with different miss policies: an unknown application command
//! is logged and dropped, an unknown request action is an error returned to
//! the caller.

pub mod bindings;
pub mod commands;

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use anyhow::{anyhow, Context};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::domain::CallId;
use tracing::{debug, warn};

use crate::error::{BridgeError, UnrecognizedActionError};
use commands::{AppCommand, RequestAction};

pub type CommandHandler =
    Arc<dyn Fn(CommandArgs) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Positional arguments that followed the command name on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs(Vec<Value>);

impl CommandArgs {
    pub fn new(args: Vec<Value>) -> Self {
        Self(args)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    /// Decodes argument `index` as `T`.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let value = self
            .0
            .get(index)
            .ok_or_else(|| anyhow!("missing argument #{index}"))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("argument #{index} has an unexpected shape"))
    }

    /// The caller-chosen call id remote-call commands carry first.
    pub fn call_id(&self) -> anyhow::Result<CallId> {
        self.parse(0)
    }
}

impl From<Vec<Value>> for CommandArgs {
    fn from(value: Vec<Value>) -> Self {
        Self::new(value)
    }
}

/// Collects handlers for one vocabulary before freezing them into a table.
pub struct TableBuilder<K> {
    handlers: HashMap<K, CommandHandler>,
}

impl<K: Eq + Hash> TableBuilder<K> {
    fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Binds `key` to `handler`, replacing an earlier binding.
    pub fn bind<F, Fut>(mut self, key: K, handler: F) -> Self
    where
        F: Fn(CommandArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handlers
            .insert(key, Arc::new(move |args| handler(args).boxed()));
        self
    }
}

impl TableBuilder<AppCommand> {
    pub fn build(self) -> ApplicationCommandTable {
        ApplicationCommandTable {
            handlers: self.handlers,
        }
    }
}

impl TableBuilder<RequestAction> {
    pub fn build(self) -> RequestActionTable {
        RequestActionTable {
            handlers: self.handlers,
        }
    }
}

pub struct ApplicationCommandTable {
    handlers: HashMap<AppCommand, CommandHandler>,
}

impl ApplicationCommandTable {
    pub fn builder() -> TableBuilder<AppCommand> {
        TableBuilder::new()
    }

    pub fn handles(&self, command: AppCommand) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Runs the handler bound to `name`. Names outside the table, for example
    /// from a stale menu definition, only produce a warning.
    pub async fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        let Some(handler) = AppCommand::from_name(name).and_then(|c| self.handlers.get(&c)) else {
            warn!(command = name, "router: unrecognized application command");
            return Ok(());
        };
        debug!(command = name, args = args.len(), "router: dispatching command");
        handler(CommandArgs::new(args))
            .await
            .map_err(BridgeError::Handler)
    }
}

pub struct RequestActionTable {
    handlers: HashMap<RequestAction, CommandHandler>,
}

impl RequestActionTable {
    pub fn builder() -> TableBuilder<RequestAction> {
        TableBuilder::new()
    }

    pub fn handles(&self, action: RequestAction) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Runs the handler bound to `name`. Request actions only come from code
    /// the application controls, so an unknown name is a defect and fails.
    pub async fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        let handler = RequestAction::from_name(name)
            .and_then(|action| self.handlers.get(&action))
            .ok_or_else(|| UnrecognizedActionError {
                action: name.to_string(),
            })?;
        debug!(action = name, args = args.len(), "router: dispatching request action");
        handler(CommandArgs::new(args))
            .await
            .map_err(BridgeError::Handler)
    }
}

#[cfg(test)]
#[path = "../tests/router_tests.rs"]
mod tests;
