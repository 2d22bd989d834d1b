//! Ordered startup of the renderer window.
//!
//! AwaitingConfig → ConfigReceived → Built → PathResolved → Ready. The
//! sequence never moves backwards; a fatal startup error leaves it where it
//! failed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join;
use serde_json::Value;
use shared::{domain::WindowConfig, protocol::OutboundMessage};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    bridge::Bridge, collaborators::Collaborators, debounce::DebounceRegistry, error::BridgeError,
    settings::BridgeSettings,
};

/// Debounce name of the loading indicator fade-out.
pub const LOADING_INDICATOR: &str = "loading-indicator";
const PROTOCOL_ACTION_PREFIX: &str = "file-protocol-action/";
const DRIVE_SOURCE: &str = "google-drive";
const OPEN_ACTION: &str = "open";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    AwaitingConfig,
    ConfigReceived,
    Built,
    PathResolved,
    Ready,
}

impl LifecycleState {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::AwaitingConfig => "awaiting_config",
            LifecycleState::ConfigReceived => "config_received",
            LifecycleState::Built => "built",
            LifecycleState::PathResolved => "path_resolved",
            LifecycleState::Ready => "ready",
        }
    }
}

/// What the start path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPath {
    /// `file-protocol-action/<source>/<action>/<id>`
    ProtocolAction {
        source: String,
        action: String,
        id: String,
    },
    /// Any other path becomes the in-app location.
    Navigate(String),
}

impl StartPath {
    /// `None` for a blank path.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().trim_start_matches('#');
        if raw.is_empty() {
            return None;
        }

        let Some(rest) = raw.strip_prefix(PROTOCOL_ACTION_PREFIX) else {
            return Some(StartPath::Navigate(raw.to_string()));
        };
        let mut parts = rest.splitn(3, '/').map(str::to_string);
        Some(StartPath::ProtocolAction {
            source: parts.next().unwrap_or_default(),
            action: parts.next().unwrap_or_default(),
            id: parts.next().unwrap_or_default(),
        })
    }

    /// Location hash for a navigation path.
    pub fn location(route: &str) -> String {
        format!("#{route}")
    }
}

/// Process state gathered during startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialState {
    pub config: WindowConfig,
    pub preferences: Value,
}

impl InitialState {
    /// Theme id stored in the preferences, if any.
    pub fn theme(&self) -> Option<String> {
        self.preferences
            .get("theme")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

pub struct LifecycleSequencer {
    bridge: Arc<Bridge>,
    debounce: DebounceRegistry,
    collaborators: Collaborators,
    settings: BridgeSettings,
    initial: Arc<Mutex<InitialState>>,
    state: watch::Sender<LifecycleState>,
}

impl LifecycleSequencer {
    pub fn new(
        bridge: Arc<Bridge>,
        debounce: DebounceRegistry,
        collaborators: Collaborators,
        settings: BridgeSettings,
        initial: Arc<Mutex<InitialState>>,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::AwaitingConfig);
        Self {
            bridge,
            debounce,
            collaborators,
            settings,
            initial,
            state,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub async fn run(&self) -> Result<(), BridgeError> {
        let received = self.bridge.request_window_state().await?;
        let config = {
            let mut initial = self.initial();
            initial.config.merge(received);
            initial.config.clone()
        };
        self.enter(LifecycleState::ConfigReceived);

        self.build(&config).await?;
        self.enter(LifecycleState::Built);

        self.run_upgrades().await;
        self.enter(LifecycleState::PathResolved);

        self.resolve_start_path(config.start_path()).await;
        self.finish();
        Ok(())
    }

    /// Builds the UI while preferences load and the theme resolves. Failing
    /// to build or to load preferences aborts startup; a theme failure does
    /// not.
    async fn build(&self, config: &WindowConfig) -> Result<(), BridgeError> {
        let surface = self.collaborators.ui.build(config);
        let preferences_and_theme = async {
            let preferences = self.collaborators.preferences.load().await?;
            let theme = {
                let mut initial = self.initial();
                initial.preferences = preferences;
                initial.theme()
            };
            if let Err(err) = self
                .collaborators
                .theme
                .apply(theme.as_deref(), config.dark_mode)
                .await
            {
                warn!(theme = ?theme, error = %err, "lifecycle: theme load failed, keeping default");
            }
            anyhow::Ok(())
        };

        let (built, loaded) = join(surface, preferences_and_theme).await;
        loaded.map_err(|err| self.fatal(err))?;
        built.map_err(|err| self.fatal(err))?;
        Ok(())
    }

    async fn run_upgrades(&self) {
        let preferences = self.initial().preferences.clone();
        match self.collaborators.upgrades.run_upgrades(&preferences).await {
            Ok(0) => debug!("lifecycle: no upgrades to apply"),
            Ok(applied) => info!(applied, "lifecycle: upgrades applied"),
            Err(err) => warn!(error = %err, "lifecycle: upgrade check failed"),
        }
    }

    async fn resolve_start_path(&self, start_path: Option<&str>) {
        match start_path.and_then(StartPath::parse) {
            None => debug!("lifecycle: no start path"),
            Some(StartPath::Navigate(route)) => {
                self.collaborators
                    .navigator
                    .navigate(&StartPath::location(&route));
            }
            Some(StartPath::ProtocolAction { source, action, id }) => {
                self.run_protocol_action(&source, &action, &id).await;
            }
        }
    }

    async fn run_protocol_action(&self, source: &str, action: &str, id: &str) {
        if source != DRIVE_SOURCE || action != OPEN_ACTION || id.is_empty() {
            warn!(source, action, id, "lifecycle: unsupported protocol action");
            return;
        }
        info!(file_id = id, "lifecycle: opening drive file from start path");
        if let Err(err) = self.collaborators.protocol_actions.open_drive_file(id).await {
            warn!(file_id = id, error = %err, "lifecycle: drive file open failed");
        }
    }

    fn finish(&self) {
        let ui = Arc::clone(&self.collaborators.ui);
        self.debounce
            .schedule(LOADING_INDICATOR, self.settings.loader_fade, move || {
                ui.remove_loader();
            });
        self.enter(LifecycleState::Ready);
    }

    /// Reports a startup failure across the boundary and turns it into the
    /// error that aborts the sequence.
    fn fatal(&self, err: anyhow::Error) -> BridgeError {
        let message = format!("{err:#}");
        error!(error = %message, "lifecycle: startup failed");
        if let Err(send_err) = self.bridge.send(OutboundMessage::FatalError {
            message: message.clone(),
        }) {
            error!(error = %send_err, "lifecycle: could not report startup failure");
        }
        BridgeError::StartupFatal { message }
    }

    fn enter(&self, next: LifecycleState) {
        info!(state = next.name(), "lifecycle: transition");
        self.state.send_replace(next);
    }

    fn initial(&self) -> MutexGuard<'_, InitialState> {
        self.initial.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
