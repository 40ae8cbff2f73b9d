//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Pricer error: {0}")]
    Pricer(#[from] merc_pricer::PricerError),

    #[error("Pricelist error: {0}")]
    Pricelist(#[from] merc_pricelist::PricelistError),

    #[error("Feed error: {0}")]
    Feed(#[from] merc_feed::FeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
