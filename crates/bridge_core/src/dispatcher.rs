//! Inbound half of the process boundary: decodes every message from the far
//! side and hands it to the correlator, the command tables or the window
//! services.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use shared::protocol::{BoundaryMessage, InboundMessage};
use tokio::sync::{mpsc, watch};
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{debug, error, warn};

use crate::{
    bridge::Bridge,
    collaborators::{Navigator, ThemeLoader},
    error::BridgeError,
    lifecycle::{InitialState, LifecycleState},
    router::{ApplicationCommandTable, RequestActionTable},
};

/// A command that waits for the window to become ready.
#[derive(Debug)]
enum Routed {
    Command { name: String, args: Vec<Value> },
    Action { name: String, args: Vec<Value> },
}

pub struct InboundDispatcher {
    bridge: Arc<Bridge>,
    app_commands: Arc<ApplicationCommandTable>,
    request_actions: Arc<RequestActionTable>,
    theme: Arc<dyn ThemeLoader>,
    navigator: Arc<dyn Navigator>,
    initial: Arc<Mutex<InitialState>>,
    lifecycle: watch::Receiver<LifecycleState>,
    backlog: Vec<Routed>,
}

impl InboundDispatcher {
    pub fn new(
        bridge: Arc<Bridge>,
        app_commands: Arc<ApplicationCommandTable>,
        request_actions: Arc<RequestActionTable>,
        theme: Arc<dyn ThemeLoader>,
        navigator: Arc<dyn Navigator>,
        initial: Arc<Mutex<InitialState>>,
        lifecycle: watch::Receiver<LifecycleState>,
    ) -> Self {
        Self {
            bridge,
            app_commands,
            request_actions,
            theme,
            navigator,
            initial,
            lifecycle,
            backlog: Vec::new(),
        }
    }

    /// Processes inbound messages until the stream ends.
    ///
    /// Commands are held back until the lifecycle reports `Ready` and then
    /// replayed in arrival order. A response without a pending call stops the
    /// loop with the correlation error.
    pub async fn run(
        mut self,
        inbound: mpsc::UnboundedReceiver<BoundaryMessage>,
    ) -> Result<(), BridgeError> {
        let mut inbound = UnboundedReceiverStream::new(inbound);
        let mut ready = self.is_ready();
        let mut watching = !ready;

        loop {
            tokio::select! {
                message = inbound.next() => {
                    let Some(message) = message else {
                        debug!("dispatcher: inbound stream ended");
                        return Ok(());
                    };
                    self.handle(message, ready)?;
                }
                changed = self.lifecycle.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    }
                    if self.is_ready() {
                        watching = false;
                        ready = true;
                        self.flush_backlog();
                    }
                }
            }
        }
    }

    fn handle(&mut self, message: BoundaryMessage, ready: bool) -> Result<(), BridgeError> {
        let topic = message.topic.clone();
        let message = match InboundMessage::parse(message) {
            Ok(message) => message,
            Err(err) => {
                warn!(topic = %topic, error = %err, "dispatcher: malformed message dropped");
                return Ok(());
            }
        };

        match message {
            InboundMessage::Reply(frame) => {
                let id = frame.id;
                if let Err(err) = self.bridge.correlator().complete_frame(frame) {
                    error!(
                        call_id = id.0,
                        "dispatcher: response without pending call, boundary out of sync"
                    );
                    return Err(err.into());
                }
            }
            InboundMessage::WindowStateInfo(config) => {
                if !self.bridge.accept_window_state(config)? {
                    warn!("dispatcher: window-state-info without a pending request ignored");
                }
            }
            InboundMessage::Command { name, args } => {
                self.route_or_defer(Routed::Command { name, args }, ready)
            }
            InboundMessage::RequestAction { name, args } => {
                self.route_or_defer(Routed::Action { name, args }, ready)
            }
            InboundMessage::SystemThemeChanged { dark_mode } => self.switch_theme(dark_mode),
            InboundMessage::AppNavigate { detail } => self.navigator.notify(detail),
            InboundMessage::Unhandled { topic, args } => {
                debug!(topic = %topic, args = args.len(), "dispatcher: no listener for topic");
            }
        }
        Ok(())
    }

    fn route_or_defer(&mut self, routed: Routed, ready: bool) {
        if ready {
            self.route(routed);
        } else {
            debug!(?routed, "dispatcher: window not ready, deferring");
            self.backlog.push(routed);
        }
    }

    fn flush_backlog(&mut self) {
        for routed in std::mem::take(&mut self.backlog) {
            self.route(routed);
        }
    }

    /// Each command runs in its own task so a handler awaiting a correlated
    /// call does not stall reply processing.
    fn route(&self, routed: Routed) {
        match routed {
            Routed::Command { name, args } => {
                let table = Arc::clone(&self.app_commands);
                tokio::spawn(async move {
                    if let Err(err) = table.dispatch(&name, args).await {
                        error!(command = %name, error = %err, "dispatcher: command failed");
                    }
                });
            }
            Routed::Action { name, args } => {
                let table = Arc::clone(&self.request_actions);
                tokio::spawn(async move {
                    if let Err(err) = table.dispatch(&name, args).await {
                        error!(action = %name, error = %err, "dispatcher: request action failed");
                    }
                });
            }
        }
    }

    fn switch_theme(&self, dark_mode: bool) {
        let theme = {
            let mut initial = self.initial.lock().unwrap_or_else(PoisonError::into_inner);
            initial.config.dark_mode = dark_mode;
            initial.theme()
        };
        let loader = Arc::clone(&self.theme);
        tokio::spawn(async move {
            if let Err(err) = loader.apply(theme.as_deref(), dark_mode).await {
                warn!(dark_mode, error = %err, "dispatcher: system theme switch failed");
            }
        });
    }

    fn is_ready(&self) -> bool {
        *self.lifecycle.borrow() == LifecycleState::Ready
    }
}
