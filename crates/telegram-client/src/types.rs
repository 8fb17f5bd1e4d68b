//! Bot API request and response types.
//!
//! Only the fields the bot uses are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// The envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i32>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier; the next poll offset is `update_id + 1`.
    pub update_id: i64,

    /// New incoming message.
    #[serde(default)]
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,

    /// Sender; absent for messages sent on behalf of channels.
    #[serde(default)]
    pub from: Option<User>,

    pub chat: Chat,

    /// Unix timestamp (seconds).
    #[serde(default)]
    pub date: i64,

    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A chat a message was sent in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Chat {
    /// Whether this is a one-to-one chat with the bot.
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

/// An entry of the bot's command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    /// Command name without the leading slash (1-32 chars, lowercase).
    pub command: String,
    /// Description shown in the menu.
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Parameters for `getUpdates`.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long polling timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

impl SendMessageParams {
    /// Create plain-text message params.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            disable_web_page_preview: None,
        }
    }
}

/// Parameters for `setMyCommands`.
#[derive(Debug, Clone, Serialize)]
pub struct SetMyCommandsParams {
    pub commands: Vec<BotCommand>,
}
