use std::time::Duration;

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound for each backend call made while reconciling or saving.
    pub backend_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// `0` keeps the default timeout.
    pub fn from_request_timeout_ms(ms: u64) -> Self {
        if ms == 0 {
            Self::default()
        } else {
            Self {
                backend_timeout: Duration::from_millis(ms),
            }
        }
    }
}
