//! Telegram Bot API HTTP client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::error::TelegramError;
use crate::types::{
    ApiResponse, BotCommand, GetUpdatesParams, Message, SendMessageParams, SetMyCommandsParams,
    Update, User,
};

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: BotConfig,
}

impl TelegramClient {
    /// Create a client without contacting Telegram.
    pub fn new(config: BotConfig) -> Result<Self, TelegramError> {
        if config.token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self { http, config })
    }

    /// Create a client and verify the token with `getMe`.
    ///
    /// Returns the client together with the bot's own user record.
    pub async fn connect(config: BotConfig) -> Result<(Self, User), TelegramError> {
        let client = Self::new(config)?;
        let me = client.get_me().await?;
        info!(
            "Connected to Telegram as @{} (id {})",
            me.username.as_deref().unwrap_or("<unknown>"),
            me.id
        );
        Ok((client, me))
    }

    /// Get the bot's own user record.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call::<(), _>("getMe", None).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.config.poll_timeout.as_secs(),
            allowed_updates: vec!["message".to_string()],
        };
        self.call("getUpdates", Some(params)).await
    }

    /// Send a plain text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let mut params = SendMessageParams::text(chat_id, text);
        params.disable_web_page_preview = Some(true);
        self.call("sendMessage", Some(params)).await
    }

    /// Replace the bot's command menu.
    pub async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<(), TelegramError> {
        let params = SetMyCommandsParams { commands };
        // setMyCommands returns `true` on success
        let _: bool = self.call("setMyCommands", Some(params)).await?;
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Make a Bot API call.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, TelegramError> {
        let url = self.config.method_url(method);
        debug!("Bot API call: {}", method);

        let mut request = self.http.post(&url);
        if let Some(ref params) = params {
            request = request.json(params);
        }

        let response = request.send().await.map_err(|e| {
            // reqwest includes the URL, and with it the token, in its errors
            TelegramError::Http(e.without_url())
        })?;

        // The Bot API reports failures in the body even for 4xx statuses.
        let body = response.bytes().await.map_err(|e| TelegramError::Http(e.without_url()))?;
        let api_response: ApiResponse<R> = serde_json::from_slice(&body)?;
        into_result(api_response)
    }
}

/// Convert a Bot API envelope into its result.
pub(crate) fn into_result<R>(response: ApiResponse<R>) -> Result<R, TelegramError> {
    if !response.ok {
        return Err(TelegramError::Api {
            code: response.error_code.unwrap_or(-1),
            description: response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    response.result.ok_or_else(|| TelegramError::Api {
        code: -1,
        description: "No result in response".to_string(),
    })
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .finish()
    }
}
