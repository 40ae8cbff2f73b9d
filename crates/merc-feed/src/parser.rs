//! Feed message parsing.
//!
//! Parses raw WebSocket frames into typed [`PriceUpdate`]s. The feed
//! multiplexes price updates with housekeeping frames (heartbeats, auth
//! acks); everything that is not a price update is counted and skipped.

use crate::error::{FeedError, FeedResult};
use chrono::DateTime;
use merc_core::{Currency, Sku};
use merc_pricer::PriceUpdate;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Frame type carrying a price update.
const PRICE_UPDATED: &str = "PRICE_UPDATED";

/// Statistics over processed frames.
#[derive(Debug, Default)]
pub struct FrameStats {
    /// Price updates successfully parsed.
    pub accepted_count: AtomicU64,
    /// Housekeeping frames skipped.
    pub ignored_count: AtomicU64,
}

impl FrameStats {
    pub fn record_accepted(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn ignored(&self) -> u64 {
        self.ignored_count.load(Ordering::Relaxed)
    }
}

/// Raw feed frame envelope.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Raw price update payload.
#[derive(Debug, Deserialize)]
struct RawPriceUpdate {
    sku: String,
    buy: Currency,
    sell: Currency,
    /// Unix seconds.
    time: i64,
    source: String,
}

/// Feed message parser.
#[derive(Debug, Default)]
pub struct MessageParser {
    stats: FrameStats,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Parse one text frame. Returns `Ok(None)` for frames that are not
    /// price updates.
    pub fn parse(&self, text: &str) -> FeedResult<Option<PriceUpdate>> {
        let frame: RawFrame = serde_json::from_str(text)
            .map_err(|e| FeedError::Parse(format!("bad frame envelope: {e}")))?;

        if frame.kind != PRICE_UPDATED {
            trace!(kind = %frame.kind, "Ignoring housekeeping frame");
            self.stats.record_ignored();
            return Ok(None);
        }

        let data = frame
            .data
            .ok_or_else(|| FeedError::Parse("price frame without data".to_string()))?;
        let raw: RawPriceUpdate = serde_json::from_value(data)
            .map_err(|e| FeedError::Parse(format!("bad price payload: {e}")))?;

        let sku: Sku = raw
            .sku
            .parse()
            .map_err(|e| FeedError::Parse(format!("bad sku in price frame: {e}")))?;
        let time = DateTime::from_timestamp(raw.time, 0)
            .ok_or_else(|| FeedError::Parse(format!("bad timestamp {} for {sku}", raw.time)))?;

        self.stats.record_accepted();
        Ok(Some(PriceUpdate {
            sku,
            buy: raw.buy,
            sell: raw.sell,
            time,
            source: raw.source,
        }))
    }
}
