//! Telegram Bot API client library.
//!
//! This crate provides a small async client for the Telegram Bot API. It
//! supports:
//!
//! - Verifying the bot token (`getMe`)
//! - Receiving messages via long polling (`getUpdates`)
//! - Sending text messages and registering the command menu
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use telegram_client::{BotConfig, TelegramClient};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let (client, _me) = TelegramClient::connect(BotConfig::new("123456:ABC-DEF")).await?;
//!
//! let mut updates = telegram_client::subscribe(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => {
//!             if let Some(message) = update.message {
//!                 if let Some(text) = message.text {
//!                     client.send_message(message.chat.id, &text).await?;
//!                 }
//!             }
//!         }
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::TelegramClient;
pub use config::BotConfig;
pub use error::TelegramError;
pub use poll::{subscribe, subscribe_with_reconnect, ReconnectConfig, UpdateStream};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
