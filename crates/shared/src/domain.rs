use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of one correlated call across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initial window configuration sent by the control process in
/// `window-state-info`. Keys this shell does not interpret are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_file: Option<String>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WindowConfig {
    /// Overlays `incoming` on top of `self`. Present values win, absent ones
    /// keep what was already known.
    pub fn merge(&mut self, incoming: WindowConfig) {
        if incoming.workspace_file.is_some() {
            self.workspace_file = incoming.workspace_file;
        }
        if incoming.start_path.is_some() {
            self.start_path = incoming.start_path;
        }
        self.dark_mode = incoming.dark_mode;
        self.extra.extend(incoming.extra);
    }

    /// Start path with surrounding whitespace removed, `None` when blank.
    pub fn start_path(&self) -> Option<&str> {
        self.start_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}
