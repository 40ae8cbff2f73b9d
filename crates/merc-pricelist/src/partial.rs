//! Partial price-update heuristic.
//!
//! When a remote revision arrives while the item is in stock, blindly
//! overwriting can leave the bot selling below what it just paid.
//! Instead of yanking the sell price down (or the buy price up) under
//! held stock, a qualifying revision is applied one side at a time and
//! the entry is tagged `isPartialPriced` until it is fully re-synced.

use crate::entry::Entry;
use merc_core::Sku;
use merc_pricer::ItemPrice;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_threshold_secs() -> i64 {
    28_800 // 8 hours
}

/// Gating configuration for partial price updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialUpdateConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Remote revisions older than this relative to the local refresh
    /// are always fully applied.
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: i64,
    /// Skus never partially updated. The key item is always implicitly
    /// excluded.
    #[serde(default)]
    pub exclude_skus: Vec<Sku>,
}

impl Default for PartialUpdateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_secs: default_threshold_secs(),
            exclude_skus: Vec::new(),
        }
    }
}

/// How to fold a remote price revision into a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Replace buy, sell and the refresh timestamp.
    Overwrite,
    /// Adopt only the listed sides, tag the entry `isPartialPriced`,
    /// and leave the refresh timestamp untouched so the entry stays due
    /// for another look.
    Partial {
        buy: Option<merc_core::Currency>,
        sell: Option<merc_core::Currency>,
    },
    /// Leave the entry untouched.
    Keep,
}

/// Decide how to apply `remote` to `entry`.
///
/// The full-overwrite path is the normal case; the heuristic only
/// engages when it is enabled, the item is in stock, the revision is
/// within the threshold of the local refresh, and the sku is not
/// excluded.
pub fn decide(
    entry: &Entry,
    remote: &ItemPrice,
    key_rate: Decimal,
    in_stock: bool,
    config: &PartialUpdateConfig,
) -> UpdateDecision {
    let (Some(old), Some(local_time)) = (entry.price_pair(), entry.time) else {
        return UpdateDecision::Overwrite;
    };

    if !config.enabled || !in_stock {
        return UpdateDecision::Overwrite;
    }
    if entry.sku.is_key() || config.exclude_skus.contains(&entry.sku) {
        return UpdateDecision::Overwrite;
    }
    if (remote.time - local_time).num_seconds() >= config.threshold_secs {
        return UpdateDecision::Overwrite;
    }

    let old_buy = old.buy.to_value(key_rate);
    let old_sell = old.sell.to_value(key_rate);
    let new_buy = remote.buy.to_value(key_rate);
    let new_sell = remote.sell.to_value(key_rate);

    if new_sell - old_buy < Decimal::ZERO || entry.is_partial_priced() {
        if new_buy < old_sell {
            // The new buy is still profitable against the sell we hold;
            // only raise the sell, never lower it.
            UpdateDecision::Partial {
                buy: Some(remote.buy),
                sell: (new_sell > old_sell).then_some(remote.sell),
            }
        } else if new_sell > old_sell {
            UpdateDecision::Partial {
                buy: None,
                sell: Some(remote.sell),
            }
        } else {
            UpdateDecision::Keep
        }
    } else {
        // An entry already tagged isPartialPriced never reaches this
        // branch (the tag routes it above), so it is never silently
        // promoted back to full pricing.
        UpdateDecision::Overwrite
    }
}
