//! Feed connection lifecycle.
//!
//! Maintains the WebSocket subscription with automatic reconnection and
//! exponential backoff, and forwards parsed updates to the consumer
//! channel. The feed is consume-only; there is no write path.

use crate::error::{FeedError, FeedResult};
use crate::parser::MessageParser;
use futures_util::StreamExt;
use merc_pricer::PriceUpdate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

/// Feed connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// WebSocket URL of the live price feed.
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Live feed connection manager.
pub struct FeedConnection {
    config: FeedConfig,
    update_tx: mpsc::Sender<PriceUpdate>,
    parser: MessageParser,
    shutdown: CancellationToken,
}

impl FeedConnection {
    pub fn new(config: FeedConfig, update_tx: mpsc::Sender<PriceUpdate>) -> Self {
        Self {
            config,
            update_tx,
            parser: MessageParser::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token for signalling shutdown from another task.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the connect/read/reconnect loop until shutdown.
    pub async fn run(&self) -> FeedResult<()> {
        let mut attempt: u32 = 0;
        loop {
            if self.shutdown.is_cancelled() {
                info!("Feed shutdown requested");
                return Ok(());
            }

            match self.connect_and_read().await {
                Ok(()) => {
                    if self.shutdown.is_cancelled() {
                        return Ok(());
                    }
                    // Clean close still reconnects, from a fresh backoff.
                    attempt = 0;
                    info!("Feed connection closed, reconnecting");
                }
                Err(FeedError::ChannelClosed) => {
                    info!("Feed consumer gone, stopping");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Feed connection failed");
                }
            }

            attempt += 1;
            if self.config.max_reconnect_attempts > 0
                && attempt > self.config.max_reconnect_attempts
            {
                return Err(FeedError::ReconnectLimit);
            }

            let delay = self.backoff_delay(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn connect_and_read(&self) -> FeedResult<()> {
        info!(url = %self.config.url, "Connecting to price feed");
        let (mut stream, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| FeedError::Socket(format!("connect failed: {e}")))?;
        info!("Price feed connected");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                frame = stream.next() => {
                    match frame {
                        None => return Ok(()),
                        Some(Err(e)) => return Err(FeedError::Socket(e.to_string())),
                        Some(Ok(Message::Text(text))) => self.handle_text(&text).await?,
                        Some(Ok(Message::Close(_))) => return Ok(()),
                        // Pings are answered by the library; everything
                        // else on this feed is text.
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    async fn handle_text(&self, text: &str) -> FeedResult<()> {
        match self.parser.parse(text) {
            Ok(Some(update)) => {
                debug!(sku = %update.sku, source = %update.source, "Price update received");
                if self.update_tx.send(update).await.is_err() {
                    return Err(FeedError::ChannelClosed);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping malformed feed frame"),
        }
        Ok(())
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay_ms = self
            .config
            .reconnect_base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.config.reconnect_max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}
