//! Price source data types.

use chrono::{DateTime, Utc};
use merc_core::{Currency, Sku};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which remote pricer feeds this bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricerKind {
    /// The public prices.tf service.
    #[default]
    #[serde(rename = "ptf")]
    PricesTf,
    /// A self-hosted pricer speaking the same protocol.
    #[serde(rename = "custom")]
    Custom,
}

impl PricerKind {
    /// Wire identifier, as carried in feed notifications.
    pub fn id(&self) -> &'static str {
        match self {
            Self::PricesTf => "ptf",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PricerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One priced item as reported by the price source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPrice {
    pub sku: Sku,
    pub buy: Currency,
    pub sell: Currency,
    /// When the source last refreshed this price.
    pub time: DateTime<Utc>,
}

/// Acknowledgement of a price-check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAck {
    /// Display name echoed by the source, when it knows the item.
    pub name: Option<String>,
}

/// An unsolicited single-item price-change notification from the live
/// feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdate {
    pub sku: Sku,
    pub buy: Currency,
    pub sell: Currency,
    pub time: DateTime<Utc>,
    /// Wire identifier of the pricer that produced this notification
    /// (compare against [`PricerKind::id`]).
    pub source: String,
}

impl PriceUpdate {
    /// View this notification as a plain remote price.
    pub fn as_item_price(&self) -> ItemPrice {
        ItemPrice {
            sku: self.sku.clone(),
            buy: self.buy,
            sell: self.sell,
            time: self.time,
        }
    }
}
