#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bridge_core::{
    collaborators::{
        AppFacade, Navigator, PreferenceStore, ProtocolActionHandler, RequestWorkspace,
        ThemeLoader, UiSurface, UpgradeChecker,
    },
    compose, BridgeSettings, ChannelBoundary, Collaborators, CommandArgs, LifecycleState, Shell,
};
use serde_json::{json, Value};
use shared::{
    domain::WindowConfig,
    protocol::{BoundaryMessage, WINDOW_STATE_INFO, WINDOW_STATE_REQUEST},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::timeout,
};

pub const WAIT: Duration = Duration::from_secs(5);

type Calls = Mutex<Vec<(String, Vec<Value>)>>;

#[derive(Default)]
pub struct FakeApp {
    pub calls: Calls,
    pub tabs: AtomicUsize,
    pub activated: Mutex<Vec<usize>>,
    pub request: Mutex<Value>,
    pub fail_activation: AtomicBool,
}

impl FakeApp {
    fn record(&self, name: &str, args: CommandArgs) -> Result<()> {
        self.calls
            .lock()
            .expect("lock")
            .push((name.to_string(), args.into_inner()));
        Ok(())
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().expect("lock").clone()
    }
}

/// Implements `$facade` for `FakeApp`, recording every forwarded command
/// under its wire name. Trailing items are copied into the impl as written.
macro_rules! recording {
    ($facade:ident { $($method:ident => $name:literal),+ $(,)? } $($extra:tt)*) => {
        #[async_trait]
        impl $facade for FakeApp {
            $(
                async fn $method(&self, args: CommandArgs) -> Result<()> {
                    self.record($name, args)
                }
            )+
            $($extra)*
        }
    };
}

recording! {
    AppFacade {
        show_settings => "show-settings",
        about => "about",
        open_license => "open-license",
        import_data => "import-data",
        export_data => "export-data",
        open_saved => "open-saved",
        open_history => "open-history",
        open_drive => "open-drive",
        open_messages => "open-messages",
        login_external_webservice => "login-external-webservice",
        open_cookie_manager => "open-cookie-manager",
        open_hosts_editor => "open-hosts-editor",
        open_themes => "open-themes",
        open_requests_workspace => "open-requests-workspace",
        open_web_socket => "open-web-socket",
        popup_menu => "popup-menu",
        process_external_file => "process-external-file",
        open_onboarding => "open-onboarding",
        open_workspace_details => "open-workspace-details",
        export_workspace => "export-workspace",
    }

    async fn tabs_count(&self) -> Result<usize> {
        Ok(self.tabs.load(Ordering::SeqCst))
    }

    async fn activate_tab(&self, index: usize) -> Result<()> {
        if self.fail_activation.load(Ordering::SeqCst) {
            return Err(anyhow!("tab {index} does not exist"));
        }
        self.activated.lock().expect("lock").push(index);
        Ok(())
    }

    async fn request_data(&self) -> Result<Value> {
        Ok(self.request.lock().expect("lock").clone())
    }
}

recording! {
    RequestWorkspace {
        save => "save",
        save_as => "save-as",
        new_tab => "new-tab",
        send_current => "send-current",
        update_request => "update-request",
        close_tab => "close-tab",
    }
}

#[derive(Default)]
pub struct FakeUi {
    pub built: Mutex<Vec<WindowConfig>>,
    pub loader_removed: AtomicBool,
    pub fail_build: AtomicBool,
}

#[async_trait]
impl UiSurface for FakeUi {
    async fn build(&self, config: &WindowConfig) -> Result<()> {
        if self.fail_build.load(Ordering::SeqCst) {
            return Err(anyhow!("template missing"));
        }
        self.built.lock().expect("lock").push(config.clone());
        Ok(())
    }

    fn remove_loader(&self) {
        self.loader_removed.store(true, Ordering::SeqCst);
    }
}

pub struct FakePreferences {
    pub result: Mutex<Result<Value, String>>,
}

impl Default for FakePreferences {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(json!({"theme": "anypoint"}))),
        }
    }
}

#[async_trait]
impl PreferenceStore for FakePreferences {
    async fn load(&self) -> Result<Value> {
        self.result
            .lock()
            .expect("lock")
            .clone()
            .map_err(|message| anyhow!(message))
    }
}

#[derive(Default)]
pub struct FakeTheme {
    pub applied: Mutex<Vec<(Option<String>, bool)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ThemeLoader for FakeTheme {
    async fn apply(&self, theme: Option<&str>, dark_mode: bool) -> Result<()> {
        self.applied
            .lock()
            .expect("lock")
            .push((theme.map(str::to_string), dark_mode));
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("theme package not installed"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUpgrades {
    pub runs: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl UpgradeChecker for FakeUpgrades {
    async fn run_upgrades(&self, _preferences: &Value) -> Result<usize> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("upgrade store locked"));
        }
        Ok(0)
    }
}

#[derive(Default)]
pub struct FakeProtocolActions {
    pub opened: Mutex<Vec<String>>,
}

#[async_trait]
impl ProtocolActionHandler for FakeProtocolActions {
    async fn open_drive_file(&self, file_id: &str) -> Result<()> {
        self.opened.lock().expect("lock").push(file_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNavigator {
    pub locations: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<Value>>,
}

impl Navigator for FakeNavigator {
    fn navigate(&self, location: &str) {
        self.locations.lock().expect("lock").push(location.to_string());
    }

    fn notify(&self, detail: Value) {
        self.notifications.lock().expect("lock").push(detail);
    }
}

#[derive(Default, Clone)]
pub struct Fakes {
    pub app: Arc<FakeApp>,
    pub ui: Arc<FakeUi>,
    pub preferences: Arc<FakePreferences>,
    pub theme: Arc<FakeTheme>,
    pub upgrades: Arc<FakeUpgrades>,
    pub protocol_actions: Arc<FakeProtocolActions>,
    pub navigator: Arc<FakeNavigator>,
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            app: self.app.clone(),
            workspace: self.app.clone(),
            ui: self.ui.clone(),
            preferences: self.preferences.clone(),
            theme: self.theme.clone(),
            upgrades: self.upgrades.clone(),
            protocol_actions: self.protocol_actions.clone(),
            navigator: self.navigator.clone(),
        }
    }
}

/// A running shell wired to in-memory channels standing in for the far
/// process.
pub struct Harness {
    pub shell: Arc<Shell>,
    pub fakes: Fakes,
    pub inbound: Option<UnboundedSender<BoundaryMessage>>,
    pub outbound: UnboundedReceiver<BoundaryMessage>,
    pub run: JoinHandle<Result<(), bridge_core::BridgeError>>,
}

impl Harness {
    pub fn start(fakes: Fakes) -> Self {
        Self::start_with(fakes, BridgeSettings::default())
    }

    pub fn start_with(fakes: Fakes, settings: BridgeSettings) -> Self {
        Self::start_queued(fakes, settings, Vec::new())
    }

    /// Starts the shell with `queued` already waiting on the inbound channel.
    pub fn start_queued(
        fakes: Fakes,
        settings: BridgeSettings,
        queued: Vec<BoundaryMessage>,
    ) -> Self {
        let (boundary, outbound) = ChannelBoundary::channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        for message in queued {
            inbound_tx.send(message).expect("inbound open");
        }
        let shell = Arc::new(compose(
            Arc::new(boundary),
            fakes.collaborators(),
            settings,
        ));
        let runner = Arc::clone(&shell);
        let run = tokio::spawn(async move { runner.run(inbound_rx).await });
        Self {
            shell,
            fakes,
            inbound: Some(inbound_tx),
            outbound,
            run,
        }
    }

    pub fn send(&self, topic: &str, args: Vec<Value>) {
        self.inbound
            .as_ref()
            .expect("inbound open")
            .send(BoundaryMessage::new(topic, args))
            .expect("shell listening");
    }

    pub fn close_inbound(&mut self) {
        self.inbound.take();
    }

    pub async fn next_outbound(&mut self) -> BoundaryMessage {
        timeout(WAIT, self.outbound.recv())
            .await
            .expect("outbound message in time")
            .expect("boundary open")
    }

    /// Answers the startup configuration request with `config`.
    pub async fn answer_window_state(&mut self, config: Value) {
        let request = self.next_outbound().await;
        assert_eq!(request.topic, WINDOW_STATE_REQUEST);
        self.send(WINDOW_STATE_INFO, vec![config]);
    }

    pub async fn wait_for(&self, state: LifecycleState) {
        let mut states = self.shell.subscribe_state();
        timeout(WAIT, states.wait_for(|current| *current == state))
            .await
            .expect("state reached in time")
            .expect("sequencer alive");
    }
}

/// Polls `condition` until it holds, letting spawned handler tasks run.
pub async fn eventually(condition: impl Fn() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition reached in time");
}
