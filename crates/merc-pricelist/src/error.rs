//! Error types for merc-pricelist.

use merc_core::Sku;
use merc_pricer::PricerError;
use thiserror::Error;

/// Pricelist error types.
///
/// Caller-facing operations (add/update/remove) surface these and leave
/// the catalog unmodified. Background reconciliation logs and degrades
/// instead of propagating.
#[derive(Debug, Error)]
pub enum PricelistError {
    #[error("Invalid pricelist entry: {0}")]
    Validation(String),

    #[error("Pricelist entry already exists for {0}")]
    DuplicateEntry(Sku),

    #[error("No pricelist entry for {0}")]
    NotFound(Sku),

    #[error("Key pricing invariant violated: {0}")]
    KeyPricingInvariant(String),

    #[error("Price source unavailable: {0}")]
    PriceSource(#[from] PricerError),
}

/// Result type alias for pricelist operations.
pub type PricelistResult<T> = std::result::Result<T, PricelistError>;
