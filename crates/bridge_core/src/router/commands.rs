//! Closed vocabularies of command and request-action names.

use std::fmt;

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

vocabulary! {
    /// Application-level commands, typically sent by the native menu.
    AppCommand {
        ShowSettings => "show-settings",
        About => "about",
        OpenLicense => "open-license",
        ImportData => "import-data",
        ExportData => "export-data",
        OpenSaved => "open-saved",
        OpenHistory => "open-history",
        OpenDrive => "open-drive",
        OpenMessages => "open-messages",
        LoginExternalWebservice => "login-external-webservice",
        OpenCookieManager => "open-cookie-manager",
        OpenHostsEditor => "open-hosts-editor",
        GetTabsCount => "get-tabs-count",
        ActivateTab => "activate-tab",
        GetRequestData => "get-request-data",
        OpenThemes => "open-themes",
        OpenRequestsWorkspace => "open-requests-workspace",
        OpenWebSocket => "open-web-socket",
        PopupMenu => "popup-menu",
        ProcessExternalFile => "process-external-file",
        OpenOnboarding => "open-onboarding",
        OpenWorkspaceDetails => "open-workspace-details",
        ExportWorkspace => "export-workspace",
    }
}

vocabulary! {
    /// Actions on the active request tab. Only the application itself emits
    /// these.
    RequestAction {
        Save => "save",
        SaveAs => "save-as",
        NewTab => "new-tab",
        SendCurrent => "send-current",
        UpdateRequest => "update-request",
        CloseTab => "close-tab",
    }
}

impl AppCommand {
    /// Commands that answer the far side with a correlated reply.
    pub fn is_remote_call(self) -> bool {
        matches!(
            self,
            AppCommand::GetTabsCount | AppCommand::ActivateTab | AppCommand::GetRequestData
        )
    }
}
