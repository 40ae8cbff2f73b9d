//! Price source trait for the pricelist engine.
//!
//! Provides a trait-based abstraction over the remote pricing service.
//! This allows for:
//! - Dependency injection for testing
//! - Swapping the public pricer for a self-hosted one
//!
//! Transport policy (timeouts, retries, backoff) lives behind this seam;
//! the engine never re-implements it.

use crate::error::{PricerError, PricerResult};
use crate::types::{CheckAck, ItemPrice, PricerKind};
use merc_core::Sku;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Trait for querying the remote price source.
pub trait PriceSource: Send + Sync {
    /// Fetch the current price of a single item.
    fn get_price(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<ItemPrice>>;

    /// Fetch the full remote catalog.
    fn get_pricelist(&self) -> BoxFuture<'_, PricerResult<Vec<ItemPrice>>>;

    /// Ask the source to re-check an item's price.
    fn request_check(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<CheckAck>>;

    /// Which pricer this source speaks for.
    fn kind(&self) -> PricerKind;
}

/// Arc wrapper for PriceSource trait objects.
pub type DynPriceSource = Arc<dyn PriceSource>;

/// Mock price source for testing.
pub struct MockPriceSource {
    kind: PricerKind,
    prices: Mutex<HashMap<Sku, ItemPrice>>,
    /// Recorded re-check requests for verification.
    checks: Mutex<Vec<Sku>>,
    /// When set, every call fails with a transport error.
    failing: AtomicBool,
}

impl Default for MockPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            kind: PricerKind::PricesTf,
            prices: Mutex::new(HashMap::new()),
            checks: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_kind(mut self, kind: PricerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Install or replace a price.
    pub fn set_price(&self, price: ItemPrice) {
        self.prices.lock().insert(price.sku.clone(), price);
    }

    pub fn remove_price(&self, sku: &Sku) {
        self.prices.lock().remove(sku);
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get recorded re-check requests.
    pub fn check_requests(&self) -> Vec<Sku> {
        self.checks.lock().clone()
    }

    fn transport_error(&self) -> Option<PricerError> {
        self.failing
            .load(Ordering::SeqCst)
            .then(|| PricerError::Http("mock transport failure".to_string()))
    }
}

impl PriceSource for MockPriceSource {
    fn get_price(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<ItemPrice>> {
        let sku = sku.clone();
        Box::pin(async move {
            if let Some(err) = self.transport_error() {
                return Err(err);
            }
            self.prices
                .lock()
                .get(&sku)
                .cloned()
                .ok_or(PricerError::NotFound(sku))
        })
    }

    fn get_pricelist(&self) -> BoxFuture<'_, PricerResult<Vec<ItemPrice>>> {
        Box::pin(async move {
            if let Some(err) = self.transport_error() {
                return Err(err);
            }
            Ok(self.prices.lock().values().cloned().collect())
        })
    }

    fn request_check(&self, sku: &Sku) -> BoxFuture<'_, PricerResult<CheckAck>> {
        let sku = sku.clone();
        Box::pin(async move {
            if let Some(err) = self.transport_error() {
                return Err(err);
            }
            self.checks.lock().push(sku);
            Ok(CheckAck { name: None })
        })
    }

    fn kind(&self) -> PricerKind {
        self.kind
    }
}
