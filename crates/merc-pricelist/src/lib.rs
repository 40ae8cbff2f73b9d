//! Pricelist / key-rate reconciliation engine for the Mercantile
//! trading bot.
//!
//! This crate owns the priced-item catalog and the derived global key
//! exchange rate, and keeps both in sync with the remote price source
//! and the live price feed:
//! - `Entry`: one priced item (identity, intent, stock bounds, prices)
//! - `Pricelist`: the engine (catalog CRUD, bootstrap, stale refresh,
//!   live-feed reconciliation)
//! - `KeyPrices`: the protected global key exchange rate
//! - The partial price-update heuristic shared by both reconciliation
//!   paths

pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod inventory;
pub mod key_prices;
pub mod partial;
pub mod pricelist;
mod refresh;
pub mod retry;
pub mod schema;

pub use config::PricelistConfig;
pub use entry::{Entry, EntryData, Intent, Notes, PricePair, PARTIAL_PRICED_GROUP};
pub use error::{PricelistError, PricelistResult};
pub use events::{ChangeReason, EventBus, PricelistEvent};
pub use inventory::{DynInventory, InMemoryInventory, Inventory};
pub use key_prices::{fallback_key_prices, is_valid_key_price, KeyPrices, KeySource};
pub use partial::{PartialUpdateConfig, UpdateDecision};
pub use pricelist::{NameSearch, Pricelist, KEY_PRICE_RETRY_INTERVAL};
pub use retry::RetrySlot;
pub use schema::{decorate_name, DynItemSchema, ItemSchema, MapSchema};
