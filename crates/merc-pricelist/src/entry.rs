//! Catalog entries.
//!
//! [`EntryData`] is the operator/wire-facing shape; [`Entry`] is the
//! validated in-catalog form carrying the resolved display name. An
//! entry's sku never changes after construction.

use crate::error::{PricelistError, PricelistResult};
use chrono::{DateTime, Utc};
use merc_core::{Currency, Sku};
use serde::{Deserialize, Serialize};

/// Reserved group value marking an entry whose bounds were adjusted by
/// the partial-update heuristic rather than fully refreshed.
pub const PARTIAL_PRICED_GROUP: &str = "isPartialPriced";

/// Trading intent for an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Buy,
    Sell,
    /// Buy and sell.
    #[default]
    Bank,
}

/// Operator-facing notes attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default)]
    pub buy: Option<String>,
    #[serde(default)]
    pub sell: Option<String>,
}

/// A buy/sell price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePair {
    pub buy: Currency,
    pub sell: Currency,
}

fn default_true() -> bool {
    true
}

fn default_max() -> i32 {
    -1
}

/// Entry data before name resolution, as loaded from persistence or
/// given by an operator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub sku: Sku,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub autoprice: bool,
    #[serde(default)]
    pub intent: Intent,
    /// Minimum stock to hold.
    #[serde(default)]
    pub min: i32,
    /// Maximum stock to hold (-1 = unbounded).
    #[serde(default = "default_max")]
    pub max: i32,
    #[serde(default)]
    pub buy: Option<Currency>,
    #[serde(default)]
    pub sell: Option<Currency>,
    /// 0 or 1; gated by the premium-account flag.
    #[serde(default)]
    pub promoted: u8,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub note: Notes,
    /// Unix seconds of the last autoprice refresh.
    #[serde(default)]
    pub time: Option<i64>,
}

impl EntryData {
    /// Minimal entry data with everything else defaulted.
    pub fn new(sku: Sku) -> Self {
        Self {
            sku,
            enabled: true,
            autoprice: true,
            intent: Intent::Bank,
            min: 0,
            max: -1,
            buy: None,
            sell: None,
            promoted: 0,
            group: None,
            note: Notes::default(),
            time: None,
        }
    }

    /// Shape validation, independent of catalog state and key rate.
    pub fn validate(&self) -> PricelistResult<()> {
        if self.buy.is_some() != self.sell.is_some() {
            return Err(PricelistError::Validation(format!(
                "{}: buy and sell must be set together",
                self.sku
            )));
        }
        if !self.autoprice && self.buy.is_none() {
            return Err(PricelistError::Validation(format!(
                "{}: manually priced entries must carry buy and sell prices",
                self.sku
            )));
        }
        if self.min < 0 {
            return Err(PricelistError::Validation(format!(
                "{}: min must be non-negative",
                self.sku
            )));
        }
        if self.max < -1 {
            return Err(PricelistError::Validation(format!(
                "{}: max must be -1 (unbounded) or non-negative",
                self.sku
            )));
        }
        if self.max != -1 && self.max < self.min {
            return Err(PricelistError::Validation(format!(
                "{}: max must not be below min",
                self.sku
            )));
        }
        if self.promoted > 1 {
            return Err(PricelistError::Validation(format!(
                "{}: promoted must be 0 or 1",
                self.sku
            )));
        }
        for (side, price) in [("buy", &self.buy), ("sell", &self.sell)] {
            if let Some(price) = price {
                if !price.is_valid() {
                    return Err(PricelistError::Validation(format!(
                        "{}: {side} price has negative metal",
                        self.sku
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One priced item in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub sku: Sku,
    /// Resolved display name; the catalog's de-facto secondary key.
    pub name: String,
    pub enabled: bool,
    pub autoprice: bool,
    pub intent: Intent,
    pub min: i32,
    pub max: i32,
    pub buy: Option<Currency>,
    pub sell: Option<Currency>,
    pub promoted: u8,
    pub group: Option<String>,
    pub note: Notes,
    /// Last price refresh; `None` whenever the entry is manually priced
    /// or not yet priced.
    pub time: Option<DateTime<Utc>>,
}

impl Entry {
    /// Construct from validated data and a resolved display name.
    pub fn new(data: EntryData, name: String) -> Self {
        // The refresh timestamp is only meaningful for machine-maintained
        // prices that are actually set.
        let time = if data.autoprice && data.buy.is_some() {
            data.time.and_then(|t| DateTime::from_timestamp(t, 0))
        } else {
            None
        };
        Self {
            sku: data.sku,
            name,
            enabled: data.enabled,
            autoprice: data.autoprice,
            intent: data.intent,
            min: data.min,
            max: data.max,
            buy: data.buy,
            sell: data.sell,
            promoted: data.promoted,
            group: data.group,
            note: data.note,
            time,
        }
    }

    /// True iff both buy and sell are set.
    pub fn has_price(&self) -> bool {
        self.buy.is_some() && self.sell.is_some()
    }

    pub fn price_pair(&self) -> Option<PricePair> {
        match (self.buy, self.sell) {
            (Some(buy), Some(sell)) => Some(PricePair { buy, sell }),
            _ => None,
        }
    }

    /// True iff the partial-update heuristic has tagged this entry.
    pub fn is_partial_priced(&self) -> bool {
        self.group.as_deref() == Some(PARTIAL_PRICED_GROUP)
    }

    /// Back to the wire/persistence shape (name excluded).
    pub fn to_data(&self) -> EntryData {
        EntryData {
            sku: self.sku.clone(),
            enabled: self.enabled,
            autoprice: self.autoprice,
            intent: self.intent,
            min: self.min,
            max: self.max,
            buy: self.buy,
            sell: self.sell,
            promoted: self.promoted,
            group: self.group.clone(),
            note: self.note.clone(),
            time: self.time.map(|t| t.timestamp()),
        }
    }
}
