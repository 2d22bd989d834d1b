use std::time::Duration;

pub const DEFAULT_LOADER_FADE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Delay before the loading indicator is removed once the window is ready.
    pub loader_fade: Duration,
    /// Upper bound for awaited correlated calls. `None` waits forever.
    pub call_timeout: Option<Duration>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            loader_fade: DEFAULT_LOADER_FADE,
            call_timeout: None,
        }
    }
}
