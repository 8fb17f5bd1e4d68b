//! Configuration types for telegram-client.

use std::env;
use std::time::Duration;

use crate::error::TelegramError;

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for talking to the Telegram Bot API.
#[derive(Clone)]
pub struct BotConfig {
    /// Base URL of the Bot API server (e.g., "https://api.telegram.org").
    pub api_url: String,
    /// Bot token issued by @BotFather.
    pub token: String,
    /// Server-side long polling timeout for `getUpdates`.
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Create a new configuration with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            poll_timeout: Duration::from_secs(60),
        }
    }

    /// Create configuration against a custom Bot API server.
    pub fn with_api_url(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ..Self::new(token)
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `TELEGRAM_BOT_TOKEN`
    ///
    /// Optional env vars:
    /// - `TELEGRAM_API_URL` (default: https://api.telegram.org)
    /// - `TELEGRAM_POLL_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, TelegramError> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TelegramError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let mut config = match env::var("TELEGRAM_API_URL") {
            Ok(url) => Self::with_api_url(url, token),
            Err(_) => Self::new(token),
        };

        if let Some(secs) = env::var("TELEGRAM_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.poll_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Get the URL for a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// HTTP timeout: long enough to outlast a long poll.
    pub fn http_timeout(&self) -> Duration {
        self.poll_timeout + Duration::from_secs(10)
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
