//! Collaborators for running the shell without a real window. Commands are
//! logged, request tabs live in memory and preferences come from a JSON file.

use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bridge_core::{
    collaborators::{
        AppFacade, Navigator, PreferenceStore, ProtocolActionHandler, RequestWorkspace,
        ThemeLoader, UiSurface, UpgradeChecker,
    },
    AppCommand, Collaborators, CommandArgs, RequestAction,
};
use serde_json::{json, Value};
use shared::domain::WindowConfig;
use tracing::{debug, info};

fn blank_request() -> Value {
    json!({"method": "GET", "url": ""})
}

struct Tabs {
    requests: Vec<Value>,
    active: usize,
}

/// Application facade and request workspace backed by an in-memory tab list.
pub struct HeadlessApp {
    tabs: Mutex<Tabs>,
}

impl Default for HeadlessApp {
    fn default() -> Self {
        Self {
            tabs: Mutex::new(Tabs {
                requests: vec![blank_request()],
                active: 0,
            }),
        }
    }
}

impl HeadlessApp {
    fn tabs(&self) -> MutexGuard<'_, Tabs> {
        self.tabs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, command: &str, args: &CommandArgs) -> Result<()> {
        info!(command, args = args.len(), "headless: command received");
        Ok(())
    }
}

/// Implements `$facade` for `HeadlessApp` with each listed method only
/// logging its command. Trailing items are copied into the impl.
macro_rules! logged {
    ($facade:ident($kind:ident) { $($method:ident => $variant:ident),+ $(,)? } $($extra:tt)*) => {
        #[async_trait]
        impl $facade for HeadlessApp {
            $(
                async fn $method(&self, args: CommandArgs) -> Result<()> {
                    self.log($kind::$variant.name(), &args)
                }
            )+
            $($extra)*
        }
    };
}

logged! {
    AppFacade(AppCommand) {
        show_settings => ShowSettings,
        about => About,
        open_license => OpenLicense,
        import_data => ImportData,
        export_data => ExportData,
        open_saved => OpenSaved,
        open_history => OpenHistory,
        open_drive => OpenDrive,
        open_messages => OpenMessages,
        login_external_webservice => LoginExternalWebservice,
        open_cookie_manager => OpenCookieManager,
        open_hosts_editor => OpenHostsEditor,
        open_themes => OpenThemes,
        open_requests_workspace => OpenRequestsWorkspace,
        open_web_socket => OpenWebSocket,
        popup_menu => PopupMenu,
        process_external_file => ProcessExternalFile,
        open_onboarding => OpenOnboarding,
        open_workspace_details => OpenWorkspaceDetails,
        export_workspace => ExportWorkspace,
    }

    async fn tabs_count(&self) -> Result<usize> {
        Ok(self.tabs().requests.len())
    }

    async fn activate_tab(&self, index: usize) -> Result<()> {
        let mut tabs = self.tabs();
        if index >= tabs.requests.len() {
            bail!("no request tab at index {index}");
        }
        tabs.active = index;
        info!(index, "headless: tab activated");
        Ok(())
    }

    async fn request_data(&self) -> Result<Value> {
        let tabs = self.tabs();
        Ok(tabs.requests.get(tabs.active).cloned().unwrap_or(Value::Null))
    }
}

logged! {
    RequestWorkspace(RequestAction) {
        save => Save,
        save_as => SaveAs,
        send_current => SendCurrent,
    }

    async fn new_tab(&self, args: CommandArgs) -> Result<()> {
        self.log(RequestAction::NewTab.name(), &args)?;
        let mut tabs = self.tabs();
        tabs.requests.push(blank_request());
        tabs.active = tabs.requests.len() - 1;
        Ok(())
    }

    async fn update_request(&self, args: CommandArgs) -> Result<()> {
        self.log(RequestAction::UpdateRequest.name(), &args)?;
        let request: Value = args.parse(0).context("update-request needs the request")?;
        let mut tabs = self.tabs();
        let active = tabs.active;
        tabs.requests[active] = request;
        Ok(())
    }

    async fn close_tab(&self, args: CommandArgs) -> Result<()> {
        self.log(RequestAction::CloseTab.name(), &args)?;
        let mut tabs = self.tabs();
        let active = tabs.active;
        tabs.requests.remove(active);
        if tabs.requests.is_empty() {
            tabs.requests.push(blank_request());
        }
        tabs.active = active.min(tabs.requests.len() - 1);
        Ok(())
    }
}

pub struct HeadlessUi {
    loader_visible: AtomicBool,
}

impl Default for HeadlessUi {
    fn default() -> Self {
        Self {
            loader_visible: AtomicBool::new(true),
        }
    }
}

impl HeadlessUi {
    #[cfg(test)]
    pub fn loader_visible(&self) -> bool {
        self.loader_visible.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UiSurface for HeadlessUi {
    async fn build(&self, config: &WindowConfig) -> Result<()> {
        info!(
            workspace_file = ?config.workspace_file,
            dark_mode = config.dark_mode,
            "headless: window built"
        );
        Ok(())
    }

    fn remove_loader(&self) {
        if self.loader_visible.swap(false, Ordering::SeqCst) {
            info!("headless: loading indicator removed");
        }
    }
}

/// Preferences stored as one JSON document. No path, or a path that does not
/// exist yet, means empty preferences.
pub struct JsonFilePreferences {
    path: Option<PathBuf>,
}

impl JsonFilePreferences {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferences {
    async fn load(&self) -> Result<Value> {
        let Some(path) = &self.path else {
            debug!("headless: no preferences file configured");
            return Ok(json!({}));
        };
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "headless: preferences file not created yet");
                return Ok(json!({}));
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read preferences '{}'", path.display())
                })
            }
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("preferences '{}' are not valid JSON", path.display()))
    }
}

pub struct LoggingTheme;

#[async_trait]
impl ThemeLoader for LoggingTheme {
    async fn apply(&self, theme: Option<&str>, dark_mode: bool) -> Result<()> {
        info!(theme = theme.unwrap_or("default"), dark_mode, "headless: theme applied");
        Ok(())
    }
}

pub struct LoggingUpgrades;

#[async_trait]
impl UpgradeChecker for LoggingUpgrades {
    async fn run_upgrades(&self, _preferences: &Value) -> Result<usize> {
        debug!("headless: nothing to upgrade");
        Ok(0)
    }
}

pub struct LoggingProtocolActions;

#[async_trait]
impl ProtocolActionHandler for LoggingProtocolActions {
    async fn open_drive_file(&self, file_id: &str) -> Result<()> {
        info!(file_id, "headless: drive file requested");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNavigator {
    location: Mutex<String>,
}

impl MemoryNavigator {
    #[cfg(test)]
    pub fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, location: &str) {
        info!(location, "headless: navigated");
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.to_string();
    }

    fn notify(&self, detail: Value) {
        info!(%detail, "headless: navigation event");
    }
}

pub fn collaborators(preferences_file: Option<PathBuf>) -> Collaborators {
    let app = Arc::new(HeadlessApp::default());
    Collaborators {
        app: app.clone(),
        workspace: app,
        ui: Arc::new(HeadlessUi::default()),
        preferences: Arc::new(JsonFilePreferences::new(preferences_file)),
        theme: Arc::new(LoggingTheme),
        upgrades: Arc::new(LoggingUpgrades),
        protocol_actions: Arc::new(LoggingProtocolActions),
        navigator: Arc::new(MemoryNavigator::default()),
    }
}
