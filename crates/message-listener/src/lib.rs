//! Message listener utilities for the budget bot.
//!
//! This crate drains Telegram updates received by long polling and hands
//! each text message to a [`Brain`], sending back whatever it replies.
//!
//! # Example
//!
//! ```no_run
//! use message_listener::{Brain, MessageProcessor, ProcessorConfig};
//! use telegram_client::{BotConfig, TelegramClient};
//!
//! # async fn example<B: Brain>(brain: B) -> Result<(), Box<dyn std::error::Error>> {
//! let (client, me) = TelegramClient::connect(BotConfig::from_env()?).await?;
//!
//! let processor = MessageProcessor::new(client, brain, ProcessorConfig::with_bot_user_id(me.id));
//! processor.run().await?;
//! # Ok(())
//! # }
//! ```

mod processor;

pub use processor::{
    to_inbound_message, MessageProcessor, ProcessResult, ProcessorConfig, ProcessorError,
};

// Re-export brain types for implementors
pub use brain_core::{Brain, BrainError, InboundMessage, OutboundMessage};

// Re-export the transport types the processor is built from
pub use telegram_client::{ReconnectConfig, TelegramClient, Update};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
