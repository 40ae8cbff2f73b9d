//! Core domain types for the Mercantile trading bot.
//!
//! This crate provides fundamental types used throughout the pricing system:
//! - `Sku`: Unique item identity (defindex + quality + modifier flags)
//! - `Currency`: Precision-safe key/metal price pairs
//! - `KillstreakTier`: Killstreak modifier levels

pub mod currency;
pub mod error;
pub mod sku;

pub use currency::Currency;
pub use error::{CoreError, Result};
pub use sku::{KillstreakTier, Sku, QUALITY_UNIQUE, QUALITY_UNUSUAL};
