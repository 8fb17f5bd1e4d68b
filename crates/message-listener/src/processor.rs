//! Message processor that connects the Telegram client to a Brain implementation.

use std::time::Duration;

use brain_core::{Brain, BrainError, InboundMessage};
use futures::StreamExt;
use telegram_client::{
    Message, ReconnectConfig, TelegramClient, TelegramError, Update, UpdateStream,
};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Default timeout for brain processing (60 seconds).
const DEFAULT_BRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the message processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// The bot's own user id (to ignore messages from self).
    pub bot_user_id: Option<i64>,

    /// Whether to process messages from group chats.
    pub process_groups: bool,

    /// Whether to process private chats.
    pub process_direct: bool,

    /// Timeout for brain processing. If a brain takes longer than this to
    /// respond, the request is dropped and an error logged.
    /// Default: 60 seconds.
    pub brain_timeout: Duration,

    /// Backoff for failed `getUpdates` polls.
    pub reconnect: ReconnectConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            bot_user_id: None,
            process_groups: true,
            process_direct: true,
            brain_timeout: DEFAULT_BRAIN_TIMEOUT,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Create a new config with the bot's own user id.
    pub fn with_bot_user_id(bot_user_id: i64) -> Self {
        Self {
            bot_user_id: Some(bot_user_id),
            ..Default::default()
        }
    }

    /// Check whether a message should reach the brain.
    pub fn should_process(&self, message: &Message) -> Result<(), String> {
        let from = message
            .from
            .as_ref()
            .ok_or_else(|| "no sender".to_string())?;

        if Some(from.id) == self.bot_user_id {
            return Err("message from self".to_string());
        }
        if from.is_bot {
            return Err("message from another bot".to_string());
        }

        match message.text.as_deref() {
            Some(text) if !text.trim().is_empty() => {}
            _ => return Err("no text content".to_string()),
        }

        let is_direct = message.chat.is_private();
        if !is_direct && !self.process_groups {
            return Err("group messages disabled".to_string());
        }
        if is_direct && !self.process_direct {
            return Err("direct messages disabled".to_string());
        }

        Ok(())
    }
}

/// Convert a Telegram message into a brain message.
///
/// Returns `None` for messages without a sender or text.
pub fn to_inbound_message(message: &Message) -> Option<InboundMessage> {
    let from = message.from.as_ref()?;
    let text = message.text.as_deref()?;

    let inbound = InboundMessage::in_chat(from.id, message.chat.id, text, message.date);
    Some(match &from.username {
        Some(username) => inbound.with_username(username.as_str()),
        None => inbound,
    })
}

/// Errors that can occur during message processing.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Error from the Telegram API.
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Error from the brain during processing.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Brain processing timed out.
    #[error("brain processing timed out after {0:?}")]
    Timeout(Duration),

    /// The update stream ended unexpectedly.
    #[error("update stream ended")]
    StreamEnded,
}

/// Result of processing a single update.
#[derive(Debug)]
pub enum ProcessResult {
    /// Message was processed and every reply sent.
    Responded { user_id: i64, replies: usize },
    /// Message was skipped (e.g., from self, or not a text message).
    Skipped { reason: String },
    /// Error occurred during processing.
    Error(ProcessorError),
}

/// A message processor that receives Telegram updates and processes them through a Brain.
///
/// Updates are handled one at a time in the order Telegram delivers them.
pub struct MessageProcessor<B: Brain> {
    client: TelegramClient,
    brain: B,
    config: ProcessorConfig,
}

impl<B: Brain> MessageProcessor<B> {
    /// Create a new message processor.
    pub fn new(client: TelegramClient, brain: B, config: ProcessorConfig) -> Self {
        Self {
            client,
            brain,
            config,
        }
    }

    /// Create a processor with default configuration.
    pub fn with_defaults(client: TelegramClient, brain: B) -> Self {
        Self::new(client, brain, ProcessorConfig::default())
    }

    /// Get a reference to the brain.
    pub fn brain(&self) -> &B {
        &self.brain
    }

    /// Get a reference to the client.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Process a single update and return the result.
    pub async fn process_update(&self, update: &Update) -> ProcessResult {
        let message = match &update.message {
            Some(message) => message,
            None => {
                return ProcessResult::Skipped {
                    reason: "not a new message".to_string(),
                }
            }
        };

        if let Err(reason) = self.config.should_process(message) {
            debug!("Skipping update {}: {}", update.update_id, reason);
            return ProcessResult::Skipped { reason };
        }

        let inbound = match to_inbound_message(message) {
            Some(msg) => msg,
            None => {
                return ProcessResult::Skipped {
                    reason: "could not convert to inbound message".to_string(),
                }
            }
        };

        let user_id = inbound.user_id;
        info!("Processing message from {}: {}", user_id, inbound.text);

        let response = match timeout(self.config.brain_timeout, self.brain.process(inbound)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("Brain error for {}: {}", user_id, e);
                return ProcessResult::Error(ProcessorError::Brain(e));
            }
            Err(_elapsed) => {
                error!(
                    "Brain processing timed out for {} after {:?}",
                    user_id, self.config.brain_timeout
                );
                return ProcessResult::Error(ProcessorError::Timeout(self.config.brain_timeout));
            }
        };

        // Replies go out in order; stop at the first failure so later texts
        // never arrive without the ones before them.
        for text in &response.texts {
            if let Err(e) = self.client.send_message(response.chat_id, text).await {
                error!("Failed to send reply to chat {}: {}", response.chat_id, e);
                return ProcessResult::Error(ProcessorError::Telegram(e));
            }
            debug!("Sent reply to chat {}: {}", response.chat_id, text);
        }

        ProcessResult::Responded {
            user_id,
            replies: response.texts.len(),
        }
    }

    fn updates(&self) -> UpdateStream {
        telegram_client::subscribe_with_reconnect(&self.client, self.config.reconnect.clone())
    }

    fn log_result(result: ProcessResult) {
        match result {
            ProcessResult::Responded { user_id, replies } => {
                debug!("Sent {} replies to {}", replies, user_id);
            }
            ProcessResult::Skipped { reason } => {
                debug!("Skipped: {}", reason);
            }
            ProcessResult::Error(e) => {
                // Log but continue processing
                warn!("Error processing message: {}", e);
            }
        }
    }

    /// Run the processor, handling updates until the stream ends.
    ///
    /// This method consumes self and runs indefinitely.
    pub async fn run(self) -> Result<(), ProcessorError> {
        info!("Starting message processor with brain: {}", self.brain.name());

        let mut stream = self.updates();

        while let Some(result) = stream.next().await {
            match result {
                Ok(update) => Self::log_result(self.process_update(&update).await),
                Err(e) => {
                    error!("Update stream error: {}", e);
                }
            }
        }

        warn!("Update stream ended");
        Err(ProcessorError::StreamEnded)
    }

    /// Run the processor with graceful shutdown support.
    ///
    /// This method runs until either:
    /// - The provided shutdown signal completes
    /// - The update stream ends
    ///
    /// # Example
    ///
    /// ```ignore
    /// use message_listener::{MessageProcessor, ProcessorConfig};
    /// use telegram_client::{BotConfig, TelegramClient};
    ///
    /// # async fn example(brain: impl brain_core::Brain) -> Result<(), Box<dyn std::error::Error>> {
    /// let (client, me) = TelegramClient::connect(BotConfig::from_env()?).await?;
    /// let processor = MessageProcessor::new(client, brain, ProcessorConfig::with_bot_user_id(me.id));
    ///
    /// processor
    ///     .run_with_shutdown(async {
    ///         let _ = tokio::signal::ctrl_c().await;
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<(), ProcessorError>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting message processor with brain: {} (graceful shutdown enabled)",
            self.brain.name()
        );

        let mut stream = self.updates();

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping message processor");
                    if let Err(e) = self.brain.shutdown().await {
                        warn!("Error during brain shutdown: {}", e);
                    }
                    return Ok(());
                }

                result = stream.next() => {
                    match result {
                        Some(Ok(update)) => Self::log_result(self.process_update(&update).await),
                        Some(Err(e)) => {
                            // Polling retries on its own; keep going.
                            error!("Update stream error: {}", e);
                        }
                        None => {
                            warn!("Update stream ended");
                            return Err(ProcessorError::StreamEnded);
                        }
                    }
                }
            }
        }
    }
}
