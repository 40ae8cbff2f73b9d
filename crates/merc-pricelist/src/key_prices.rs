//! Global key exchange-rate bookkeeping.
//!
//! The key item is the catalog-wide unit of account: every subsystem
//! that compares prices does so through its metal rate. A broken rate
//! must never become observable, so candidates are validated before
//! installation and a placeholder exists for first boot.

use chrono::{DateTime, Utc};
use merc_core::Currency;
use merc_pricer::PricerKind;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the current global key rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeySource {
    Ptf,
    CustomPricer,
    Manual,
}

impl From<PricerKind> for KeySource {
    fn from(kind: PricerKind) -> Self {
        match kind {
            PricerKind::PricesTf => Self::Ptf,
            PricerKind::Custom => Self::CustomPricer,
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ptf => write!(f, "ptf"),
            Self::CustomPricer => write!(f, "customPricer"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// The catalog-wide key exchange rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrices {
    pub buy: Currency,
    pub sell: Currency,
    pub src: KeySource,
    pub time: Option<DateTime<Utc>>,
}

impl KeyPrices {
    /// Invariant for installable key rates: pure metal, positive on
    /// both sides.
    pub fn is_valid(&self) -> bool {
        is_valid_key_price(&self.buy, &self.sell)
    }

    /// True iff both sides carry the same buy/sell values (source and
    /// timestamp ignored).
    pub fn same_rate(&self, other: &KeyPrices) -> bool {
        self.buy == other.buy && self.sell == other.sell
    }
}

impl fmt::Display for KeyPrices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buy {} / sell {} ({})",
            self.buy.metal, self.sell.metal, self.src
        )
    }
}

/// Check the key-pricing invariant: `keys == 0` and `metal > 0` on both
/// sides.
pub fn is_valid_key_price(buy: &Currency, sell: &Currency) -> bool {
    buy.keys == 0
        && sell.keys == 0
        && buy.metal.is_sign_positive()
        && !buy.metal.is_zero()
        && sell.metal.is_sign_positive()
        && !sell.metal.is_zero()
}

// Decimal construction is not const, hence the lazy.
static FALLBACK_RATE: Lazy<(Currency, Currency)> = Lazy::new(|| {
    (
        Currency::from_metal(Decimal::new(5511, 2)), // 55.11 ref
        Currency::from_metal(Decimal::new(5577, 2)), // 55.77 ref
    )
});

/// Hardcoded placeholder rate for first boot when neither the price
/// source nor the catalog can supply a valid key price. Temporarily
/// inaccurate by design of the bootstrap; superseded by the scheduled
/// refetch.
pub fn fallback_key_prices(src: KeySource) -> KeyPrices {
    let (buy, sell) = *FALLBACK_RATE;
    KeyPrices {
        buy,
        sell,
        src,
        time: None,
    }
}
