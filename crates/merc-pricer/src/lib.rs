//! Price source client for the Mercantile trading bot.
//!
//! Exposes the [`PriceSource`] seam the pricelist engine consumes,
//! an HTTP implementation against the remote pricing service, and a
//! mock implementation for tests.

pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use client::PricesTfClient;
pub use error::{PricerError, PricerResult};
pub use source::{BoxFuture, DynPriceSource, MockPriceSource, PriceSource};
pub use types::{CheckAck, ItemPrice, PriceUpdate, PricerKind};
