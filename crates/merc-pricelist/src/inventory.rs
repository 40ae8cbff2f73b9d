//! Inventory collaborator seam.
//!
//! The partial-update heuristic only protects stock the bot is actually
//! holding, so the engine needs to ask "how many of this sku do I own".

use dashmap::DashMap;
use merc_core::Sku;
use std::sync::Arc;

/// Trait for querying current holdings.
pub trait Inventory: Send + Sync {
    /// How many of this sku the bot currently holds.
    fn stock_count(&self, sku: &Sku) -> i64;
}

/// Arc wrapper for Inventory trait objects.
pub type DynInventory = Arc<dyn Inventory>;

/// Concurrent in-memory stock map.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    stock: DashMap<Sku, i64>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set_stock(&self, sku: Sku, count: i64) {
        if count <= 0 {
            self.stock.remove(&sku);
        } else {
            self.stock.insert(sku, count);
        }
    }

    /// Apply a stock delta (e.g., from an accepted trade).
    pub fn adjust(&self, sku: &Sku, delta: i64) {
        let current = self.stock_count(sku);
        self.set_stock(sku.clone(), current + delta);
    }
}

impl Inventory for InMemoryInventory {
    fn stock_count(&self, sku: &Sku) -> i64 {
        self.stock.get(sku).map(|count| *count).unwrap_or(0)
    }
}
