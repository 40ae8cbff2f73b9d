//! Pricelist change notifications.
//!
//! The engine owns its notification channel; collaborators subscribe
//! explicitly and unsubscribe by dropping the receiver. Events are
//! delivered in emission order. Multiple engine instances never
//! cross-talk.

use crate::entry::{Entry, PricePair};
use merc_core::Sku;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// What caused a catalog change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// An explicit operator/command edit.
    Command,
    /// Background reconciliation (stale refresh or live feed).
    Reconciliation,
    /// Whole-catalog replacement.
    BulkLoad,
}

/// Notifications emitted by the pricelist engine.
#[derive(Debug, Clone)]
pub enum PricelistEvent {
    /// A single entry was created or re-priced.
    PriceChanged { sku: Sku, entry: Box<Entry> },
    /// The catalog changed; carries a full snapshot.
    CatalogChanged {
        reason: ChangeReason,
        entries: Vec<Entry>,
    },
    /// Admin alert: the partial-update heuristic adjusted an entry
    /// instead of fully refreshing it.
    PartialPriceApplied {
        sku: Sku,
        old: PricePair,
        current: PricePair,
        remote: PricePair,
    },
    /// A live-feed full overwrite, with stock context (emitted only
    /// when price-update broadcasting is configured).
    PriceRefreshed {
        sku: Sku,
        before: Option<PricePair>,
        after: PricePair,
        stock: i64,
    },
}

/// Engine-owned broadcast channel for [`PricelistEvent`]s.
pub struct EventBus {
    tx: broadcast::Sender<PricelistEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to engine notifications. Drop the receiver to
    /// unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<PricelistEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn emit(&self, event: PricelistEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
