//! Engine configuration.

use crate::partial::PartialUpdateConfig;
use merc_pricer::PricerKind;
use serde::{Deserialize, Serialize};

fn default_max_age_secs() -> i64 {
    28_800 // 8 hours
}

/// Configuration consumed by the pricelist engine at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricelistConfig {
    /// Seconds before an autopriced entry counts as stale. Zero or
    /// negative means every entry is always considered stale.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,

    /// Partial price-update gating.
    #[serde(default)]
    pub partial_update: PartialUpdateConfig,

    /// Which pricer feeds this catalog.
    #[serde(default)]
    pub pricer: PricerKind,

    /// While autokeys scrap adjustment is active, the global key rate
    /// keeps following the feed as long as it has not been
    /// hand-overridden since the last feed value.
    #[serde(default)]
    pub autokeys_scrap_adjustment: bool,

    /// Premium-account flag; entry promotion is forced off without it.
    #[serde(default)]
    pub premium: bool,

    /// Emit broadcast notifications for live-feed full overwrites.
    #[serde(default)]
    pub broadcast_price_updates: bool,
}

impl Default for PricelistConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            partial_update: PartialUpdateConfig::default(),
            pricer: PricerKind::default(),
            autokeys_scrap_adjustment: false,
            premium: false,
            broadcast_price_updates: false,
        }
    }
}
