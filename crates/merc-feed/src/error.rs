//! Error types for merc-feed.

use thiserror::Error;

/// Feed error types.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    Socket(String),

    #[error("Malformed feed frame: {0}")]
    Parse(String),

    #[error("Reconnect limit reached")]
    ReconnectLimit,

    #[error("Update channel closed by consumer")]
    ChannelClosed,
}

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;
