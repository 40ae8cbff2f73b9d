//! Precision-safe currency values.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors critical in price comparisons.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price expressed in keys and refined metal.
///
/// Immutable value type. All comparisons go through [`Currency::to_value`],
/// which collapses the pair into a scalar metal value under a given
/// key-to-metal exchange rate; arithmetic never mutates in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    /// Whole keys.
    #[serde(default)]
    pub keys: u32,
    /// Refined metal.
    #[serde(default)]
    pub metal: Decimal,
}

impl Currency {
    pub const ZERO: Self = Self {
        keys: 0,
        metal: Decimal::ZERO,
    };

    #[inline]
    pub fn new(keys: u32, metal: Decimal) -> Self {
        Self { keys, metal }
    }

    /// A pure-metal price.
    #[inline]
    pub fn from_metal(metal: Decimal) -> Self {
        Self { keys: 0, metal }
    }

    /// A pure-key price.
    #[inline]
    pub fn from_keys(keys: u32) -> Self {
        Self {
            keys,
            metal: Decimal::ZERO,
        }
    }

    /// Collapse into a scalar metal value under the given key rate.
    #[inline]
    pub fn to_value(&self, metal_per_key: Decimal) -> Decimal {
        Decimal::from(self.keys) * metal_per_key + self.metal
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.keys == 0 && self.metal.is_zero()
    }

    /// True iff the metal component is non-negative.
    ///
    /// Key counts are unsigned; metal arrives from deserialization and
    /// can carry a sign.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.metal.is_sign_negative()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.keys, self.metal.is_zero()) {
            (0, _) => write!(f, "{} ref", self.metal),
            (1, true) => write!(f, "1 key"),
            (k, true) => write!(f, "{k} keys"),
            (1, false) => write!(f, "1 key, {} ref", self.metal),
            (k, false) => write!(f, "{k} keys, {} ref", self.metal),
        }
    }
}
