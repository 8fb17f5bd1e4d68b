//! Long-polling update stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures::stream::{self, Stream};
use tracing::{debug, info, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;

/// Configuration for retrying failed polls.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failures (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as f64) as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// A stream of incoming updates, in the order Telegram delivered them.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<Update, TelegramError>> + Send>>;

struct PollState {
    client: TelegramClient,
    reconnect: ReconnectConfig,
    offset: Option<i64>,
    buffered: VecDeque<Update>,
    failures: u32,
    exhausted: bool,
}

impl PollState {
    fn accept(&mut self, updates: Vec<Update>) {
        for update in updates {
            // Acknowledge on the next poll so Telegram stops redelivering.
            let next = update.update_id + 1;
            if self.offset.map_or(true, |offset| next > offset) {
                self.offset = Some(next);
            }
            self.buffered.push_back(update);
        }
    }
}

/// Subscribe to updates with the default retry behaviour.
pub fn subscribe(client: &TelegramClient) -> UpdateStream {
    subscribe_with_reconnect(client, ReconnectConfig::default())
}

/// Subscribe to updates with custom retry behaviour.
///
/// Poll errors are yielded to the consumer and followed by a backoff delay.
/// The stream ends once `max_retries` consecutive polls have failed.
pub fn subscribe_with_reconnect(
    client: &TelegramClient,
    reconnect: ReconnectConfig,
) -> UpdateStream {
    info!("Subscribing to Telegram updates via long polling");

    let state = PollState {
        client: client.clone(),
        reconnect,
        offset: None,
        buffered: VecDeque::new(),
        failures: 0,
        exhausted: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(update) = state.buffered.pop_front() {
                return Some((Ok(update), state));
            }
            if state.exhausted {
                return None;
            }
            if state.failures > 0 {
                let delay = state.reconnect.delay_for_attempt(state.failures - 1);
                debug!("Retrying getUpdates in {:?}", delay);
                tokio::time::sleep(delay).await;
            }

            match state.client.get_updates(state.offset).await {
                Ok(updates) => {
                    if state.failures > 0 {
                        info!("Telegram polling restored");
                    }
                    state.failures = 0;
                    state.accept(updates);
                }
                Err(e) => {
                    state.failures += 1;
                    warn!("getUpdates failed (failures: {}): {}", state.failures, e);
                    if !state.reconnect.should_retry(state.failures) {
                        state.exhausted = true;
                    }
                    return Some((Err(e), state));
                }
            }
        }
    }))
}
