//! Composition root of the renderer bridge.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use shared::protocol::{BoundaryMessage, OutboundMessage};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::{
    boundary::Boundary,
    bridge::Bridge,
    collaborators::Collaborators,
    debounce::DebounceRegistry,
    dispatcher::InboundDispatcher,
    error::BridgeError,
    lifecycle::{InitialState, LifecycleSequencer, LifecycleState},
    router::{
        bindings::{bind_app_commands, bind_request_actions},
        ApplicationCommandTable, RequestActionTable,
    },
    settings::BridgeSettings,
};

/// The object graph of one renderer window.
pub struct Shell {
    bridge: Arc<Bridge>,
    debounce: DebounceRegistry,
    app_commands: Arc<ApplicationCommandTable>,
    request_actions: Arc<RequestActionTable>,
    sequencer: LifecycleSequencer,
    collaborators: Collaborators,
    initial: Arc<Mutex<InitialState>>,
}

/// Wires every component once. Nothing here touches process-wide state, so a
/// test can build as many shells as it likes.
pub fn compose(
    boundary: Arc<dyn Boundary>,
    collaborators: Collaborators,
    settings: BridgeSettings,
) -> Shell {
    let bridge = Arc::new(Bridge::new(boundary, settings.call_timeout));
    let debounce = DebounceRegistry::new();
    let initial = Arc::new(Mutex::new(InitialState::default()));
    let app_commands = Arc::new(bind_app_commands(
        Arc::clone(&collaborators.app),
        Arc::clone(&bridge),
    ));
    let request_actions = Arc::new(bind_request_actions(Arc::clone(&collaborators.workspace)));
    let sequencer = LifecycleSequencer::new(
        Arc::clone(&bridge),
        debounce.clone(),
        collaborators.clone(),
        settings,
        Arc::clone(&initial),
    );

    Shell {
        bridge,
        debounce,
        app_commands,
        request_actions,
        sequencer,
        collaborators,
        initial,
    }
}

impl Shell {
    /// Runs startup and inbound dispatch side by side on the current task.
    /// Returns when the inbound stream ends, or with the error that aborted
    /// startup or broke correlation.
    pub async fn run(
        &self,
        inbound: mpsc::UnboundedReceiver<BoundaryMessage>,
    ) -> Result<(), BridgeError> {
        let dispatcher = InboundDispatcher::new(
            Arc::clone(&self.bridge),
            Arc::clone(&self.app_commands),
            Arc::clone(&self.request_actions),
            Arc::clone(&self.collaborators.theme),
            Arc::clone(&self.collaborators.navigator),
            Arc::clone(&self.initial),
            self.sequencer.subscribe(),
        );
        let dispatch = dispatcher.run(inbound);
        tokio::pin!(dispatch);

        // The sequencer goes first so the window-state call is registered
        // before any queued `window-state-info` is read.
        tokio::select! {
            biased;
            result = self.sequencer.run() => result?,
            result = &mut dispatch => {
                if self.state() != LifecycleState::Ready {
                    warn!(state = self.state().name(), "shell: boundary closed during startup");
                }
                return result;
            }
        }

        info!("shell: window ready");
        dispatch.await
    }

    /// Tells the far side the window is about to unload.
    pub fn window_reloading(&self) -> Result<(), BridgeError> {
        self.bridge.send(OutboundMessage::WindowReloading)
    }

    /// Entry point for trusted in-process callers such as keyboard
    /// shortcuts. Unknown actions fail.
    pub async fn dispatch_request_action(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<(), BridgeError> {
        self.request_actions.dispatch(name, args).await
    }

    pub async fn dispatch_command(&self, name: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        self.app_commands.dispatch(name, args).await
    }

    pub fn state(&self) -> LifecycleState {
        self.sequencer.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.sequencer.subscribe()
    }

    pub fn initial_state(&self) -> InitialState {
        self.initial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    pub fn debounce(&self) -> &DebounceRegistry {
        &self.debounce
    }
}
