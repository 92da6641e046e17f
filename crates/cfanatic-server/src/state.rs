use cfanatic::assistant::Assistant;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    /// Key used when a request does not carry one
    pub default_api_key: Option<String>,
    pub turn_timeout: Duration,
}

impl AppState {
    pub fn new(assistant: Assistant, default_api_key: &str, turn_timeout: Duration) -> Self {
        let default_api_key = Some(default_api_key.trim().to_string()).filter(|key| !key.is_empty());
        Self {
            assistant: Arc::new(assistant),
            default_api_key,
            turn_timeout,
        }
    }

    /// The key a turn should authenticate with, preferring the caller's own
    pub fn credential_for(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_api_key.clone())
    }
}
