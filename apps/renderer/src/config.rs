use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use bridge_core::{settings::DEFAULT_LOADER_FADE, BridgeSettings};
use toml::{Table, Value};

pub const DEFAULT_CONFIG_FILE: &str = "renderer.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererSettings {
    pub loader_fade_ms: u64,
    pub call_timeout_ms: Option<u64>,
    pub preferences_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            loader_fade_ms: DEFAULT_LOADER_FADE.as_millis() as u64,
            call_timeout_ms: None,
            preferences_file: None,
            log_filter: "info".into(),
        }
    }
}

impl RendererSettings {
    /// Flags given on the command line win over every other layer.
    pub fn override_with(&mut self, preferences_file: Option<PathBuf>, log_filter: Option<String>) {
        if let Some(path) = preferences_file {
            self.preferences_file = Some(path);
        }
        if let Some(filter) = log_filter {
            self.log_filter = filter;
        }
    }

    pub fn to_bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            loader_fade: Duration::from_millis(self.loader_fade_ms),
            call_timeout: self.call_timeout_ms.map(Duration::from_millis),
        }
    }

    fn apply_file(&mut self, file: &Table) {
        if let Some(ms) = file.get("loader_fade_ms").and_then(millis) {
            self.loader_fade_ms = ms;
        }
        if let Some(ms) = file.get("call_timeout_ms").and_then(millis) {
            self.call_timeout_ms = timeout_ms(ms);
        }
        if let Some(path) = file.get("preferences_file").and_then(Value::as_str) {
            self.preferences_file = Some(PathBuf::from(path));
        }
        if let Some(filter) = file.get("log_filter").and_then(Value::as_str) {
            self.log_filter = filter.to_string();
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = env("APP__LOADER_FADE_MS").and_then(|v| v.trim().parse().ok()) {
            self.loader_fade_ms = ms;
        }
        if let Some(ms) = env("APP__CALL_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            self.call_timeout_ms = timeout_ms(ms);
        }
        if let Some(path) = env("APP__PREFERENCES_FILE").filter(|v| !v.trim().is_empty()) {
            self.preferences_file = Some(PathBuf::from(path));
        }
        if let Some(filter) = env("APP__LOG_FILTER").filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
    }
}

/// Zero disables the timeout.
fn timeout_ms(ms: u64) -> Option<u64> {
    (ms > 0).then_some(ms)
}

fn millis(value: &Value) -> Option<u64> {
    value.as_integer().and_then(|ms| u64::try_from(ms).ok())
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
/// Values that do not parse keep the previous layer.
pub fn load_settings(config_path: Option<&Path>) -> RendererSettings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> RendererSettings {
    let mut settings = RendererSettings::default();

    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file) = raw.parse::<Table>() {
            settings.apply_file(&file);
        }
    }

    settings.apply_env(env);
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
