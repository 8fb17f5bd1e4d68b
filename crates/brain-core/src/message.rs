//! Inbound and outbound message types.

/// A text message received from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Stable platform user id of the sender.
    pub user_id: i64,
    /// Chat the message arrived in; replies go here.
    pub chat_id: i64,
    /// Sender's platform username, if they have one.
    pub username: Option<String>,
    /// Message text.
    pub text: String,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
}

impl InboundMessage {
    /// Create a message from a private chat, where chat id equals user id.
    pub fn direct(user_id: i64, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            user_id,
            chat_id: user_id,
            username: None,
            text: text.into(),
            timestamp,
        }
    }

    /// Create a message sent in a group chat.
    pub fn in_chat(user_id: i64, chat_id: i64, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            chat_id,
            ..Self::direct(user_id, text, timestamp)
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// One or more text replies to send back, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Chat to send to.
    pub chat_id: i64,
    /// Texts to send, each as its own message.
    pub texts: Vec<String>,
}

impl OutboundMessage {
    /// Create a single-text reply to the chat a message came from.
    pub fn reply_to(message: &InboundMessage, text: impl Into<String>) -> Self {
        Self {
            chat_id: message.chat_id,
            texts: vec![text.into()],
        }
    }

    /// Create an empty reply to the chat a message came from.
    pub fn empty_reply_to(message: &InboundMessage) -> Self {
        Self {
            chat_id: message.chat_id,
            texts: Vec::new(),
        }
    }

    /// Append another text.
    pub fn push(&mut self, text: impl Into<String>) {
        self.texts.push(text.into());
    }

    /// The last text, which carries the command's main answer.
    pub fn text(&self) -> Option<&str> {
        self.texts.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
