//! Seams to the parts of the window this crate only calls into: the
//! application facade behind the command tables, the request workspace behind
//! request actions, and the startup services the lifecycle sequencer drives.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::domain::WindowConfig;

use crate::router::CommandArgs;

/// Targets of the application command table. Each command receives its
/// trailing boundary arguments untouched.
#[async_trait]
pub trait AppFacade: Send + Sync {
    async fn show_settings(&self, args: CommandArgs) -> Result<()>;
    async fn about(&self, args: CommandArgs) -> Result<()>;
    async fn open_license(&self, args: CommandArgs) -> Result<()>;
    async fn import_data(&self, args: CommandArgs) -> Result<()>;
    async fn export_data(&self, args: CommandArgs) -> Result<()>;
    async fn open_saved(&self, args: CommandArgs) -> Result<()>;
    async fn open_history(&self, args: CommandArgs) -> Result<()>;
    async fn open_drive(&self, args: CommandArgs) -> Result<()>;
    async fn open_messages(&self, args: CommandArgs) -> Result<()>;
    async fn login_external_webservice(&self, args: CommandArgs) -> Result<()>;
    async fn open_cookie_manager(&self, args: CommandArgs) -> Result<()>;
    async fn open_hosts_editor(&self, args: CommandArgs) -> Result<()>;
    async fn open_themes(&self, args: CommandArgs) -> Result<()>;
    async fn open_requests_workspace(&self, args: CommandArgs) -> Result<()>;
    async fn open_web_socket(&self, args: CommandArgs) -> Result<()>;
    async fn popup_menu(&self, args: CommandArgs) -> Result<()>;
    async fn process_external_file(&self, args: CommandArgs) -> Result<()>;
    async fn open_onboarding(&self, args: CommandArgs) -> Result<()>;
    async fn open_workspace_details(&self, args: CommandArgs) -> Result<()>;
    async fn export_workspace(&self, args: CommandArgs) -> Result<()>;

    // Remote-call commands: the router answers the far side with the result.
    async fn tabs_count(&self) -> Result<usize>;
    async fn activate_tab(&self, index: usize) -> Result<()>;
    async fn request_data(&self) -> Result<Value>;
}

/// Targets of the request-action table, scoped to the active request tab.
#[async_trait]
pub trait RequestWorkspace: Send + Sync {
    async fn save(&self, args: CommandArgs) -> Result<()>;
    async fn save_as(&self, args: CommandArgs) -> Result<()>;
    async fn new_tab(&self, args: CommandArgs) -> Result<()>;
    async fn send_current(&self, args: CommandArgs) -> Result<()>;
    async fn update_request(&self, args: CommandArgs) -> Result<()>;
    async fn close_tab(&self, args: CommandArgs) -> Result<()>;
}

#[async_trait]
pub trait UiSurface: Send + Sync {
    async fn build(&self, config: &WindowConfig) -> Result<()>;
    fn remove_loader(&self);
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load(&self) -> Result<Value>;
}

#[async_trait]
pub trait ThemeLoader: Send + Sync {
    /// Loads `theme` (the default theme when `None`) in the given mode.
    async fn apply(&self, theme: Option<&str>, dark_mode: bool) -> Result<()>;
}

#[async_trait]
pub trait UpgradeChecker: Send + Sync {
    /// Returns how many upgrades were applied.
    async fn run_upgrades(&self, preferences: &Value) -> Result<usize>;
}

#[async_trait]
pub trait ProtocolActionHandler: Send + Sync {
    async fn open_drive_file(&self, file_id: &str) -> Result<()>;
}

pub trait Navigator: Send + Sync {
    /// Replaces the in-app location, e.g. `#saved/xyz`.
    fn navigate(&self, location: &str);
    /// Re-dispatches a navigation request from the far side.
    fn notify(&self, detail: Value);
}

#[derive(Clone)]
pub struct Collaborators {
    pub app: Arc<dyn AppFacade>,
    pub workspace: Arc<dyn RequestWorkspace>,
    pub ui: Arc<dyn UiSurface>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub theme: Arc<dyn ThemeLoader>,
    pub upgrades: Arc<dyn UpgradeChecker>,
    pub protocol_actions: Arc<dyn ProtocolActionHandler>,
    pub navigator: Arc<dyn Navigator>,
}
