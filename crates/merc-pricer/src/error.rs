//! Error types for merc-pricer.

use merc_core::Sku;
use thiserror::Error;

/// Price source error types.
#[derive(Debug, Error)]
pub enum PricerError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("No price for {0}")]
    NotFound(Sku),

    #[error("Malformed price data: {0}")]
    Parse(String),
}

/// Result type alias for price source operations.
pub type PricerResult<T> = std::result::Result<T, PricerError>;
