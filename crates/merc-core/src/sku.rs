//! Item identity (sku) parsing and formatting.
//!
//! A sku is the canonical string identity of a tradable item:
//! `{defindex};{quality}` followed by optional modifier flags. The same
//! string is the catalog key, the wire format of the price feed, and the
//! form operators type into commands.
//!
//! Canonical flag order: `u{effect}`, `australium`, `uncraftable`,
//! `kt-{tier}`.

use crate::error::{CoreError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Quality carrying a cosmetic effect (the only quality eligible for
/// generic price fallback).
pub const QUALITY_UNUSUAL: u8 = 5;

/// The default item quality.
pub const QUALITY_UNIQUE: u8 = 6;

/// Defindex of the distinguished key item.
const KEY_DEFINDEX: u32 = 5021;

/// Killstreak modifier tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KillstreakTier {
    #[default]
    None,
    Basic,
    Specialized,
    Professional,
}

impl KillstreakTier {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::Basic),
            2 => Some(Self::Specialized),
            3 => Some(Self::Professional),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Basic => 1,
            Self::Specialized => 2,
            Self::Professional => 3,
        }
    }
}

impl fmt::Display for KillstreakTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic => write!(f, "Killstreak"),
            Self::Specialized => write!(f, "Specialized Killstreak"),
            Self::Professional => write!(f, "Professional Killstreak"),
        }
    }
}

/// Unique item identity.
///
/// Two skus are the same item iff all fields match. The derived display
/// name is resolved externally (item-schema collaborator); the sku itself
/// is schema-independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sku {
    /// Item definition index.
    pub defindex: u32,
    /// Item quality.
    pub quality: u8,
    /// Cosmetic effect id, if any.
    pub effect: Option<u32>,
    /// Australium variant.
    pub australium: bool,
    /// Craftable unless flagged otherwise.
    pub craftable: bool,
    /// Killstreak modifier tier.
    pub killstreak: KillstreakTier,
}

impl Sku {
    /// Plain item of the given defindex and quality.
    pub fn new(defindex: u32, quality: u8) -> Self {
        Self {
            defindex,
            quality,
            effect: None,
            australium: false,
            craftable: true,
            killstreak: KillstreakTier::None,
        }
    }

    /// The distinguished key item (`5021;6`).
    pub fn key() -> Self {
        Self::new(KEY_DEFINDEX, QUALITY_UNIQUE)
    }

    pub fn is_key(&self) -> bool {
        self.defindex == KEY_DEFINDEX && self.quality == QUALITY_UNIQUE
    }

    /// True iff this is a cosmetic-effect variant (quality 5 with an
    /// effect id).
    pub fn has_effect(&self) -> bool {
        self.quality == QUALITY_UNUSUAL && self.effect.is_some()
    }

    /// The effect-less generic of this sku, used for generic price
    /// fallback of quality-5 variants.
    pub fn base(&self) -> Self {
        let mut base = self.clone();
        base.effect = None;
        base
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.defindex, self.quality)?;
        if let Some(effect) = self.effect {
            write!(f, ";u{effect}")?;
        }
        if self.australium {
            write!(f, ";australium")?;
        }
        if !self.craftable {
            write!(f, ";uncraftable")?;
        }
        if self.killstreak != KillstreakTier::None {
            write!(f, ";kt-{}", self.killstreak.level())?;
        }
        Ok(())
    }
}

impl FromStr for Sku {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let defindex = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| CoreError::InvalidSku(format!("missing defindex: {s}")))?;
        let quality = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(|| CoreError::InvalidSku(format!("missing quality: {s}")))?;

        let mut sku = Sku::new(defindex, quality);

        for flag in parts {
            if let Some(effect) = flag.strip_prefix('u') {
                sku.effect = Some(
                    effect
                        .parse::<u32>()
                        .map_err(|_| CoreError::InvalidSku(format!("bad effect flag: {s}")))?,
                );
            } else if flag == "australium" {
                sku.australium = true;
            } else if flag == "uncraftable" {
                sku.craftable = false;
            } else if let Some(level) = flag.strip_prefix("kt-") {
                let level = level
                    .parse::<u8>()
                    .map_err(|_| CoreError::InvalidSku(format!("bad killstreak flag: {s}")))?;
                sku.killstreak = KillstreakTier::from_level(level)
                    .ok_or_else(|| CoreError::InvalidSku(format!("bad killstreak tier: {s}")))?;
            } else {
                return Err(CoreError::InvalidSku(format!("unknown flag '{flag}': {s}")));
            }
        }

        Ok(sku)
    }
}

// Skus serialize as their canonical string form in every wire format.
impl Serialize for Sku {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Sku {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
