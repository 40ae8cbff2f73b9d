//! The pricelist engine.
//!
//! Owns the in-memory catalog of priced items, the derived global key
//! exchange rate, and the reconciliation algorithms that keep both in
//! sync with the price source and the live feed.
//!
//! All catalog mutation happens synchronously under one lock; network
//! round-trips complete before the lock is taken, so list mutations are
//! non-interleaved points. Callers serialize per-sku edits.

use crate::config::PricelistConfig;
use crate::entry::{Entry, EntryData, Intent, PricePair, PARTIAL_PRICED_GROUP};
use crate::error::{PricelistError, PricelistResult};
use crate::events::{ChangeReason, EventBus, PricelistEvent};
use crate::inventory::DynInventory;
use crate::key_prices::{fallback_key_prices, is_valid_key_price, KeyPrices, KeySource};
use crate::partial::{self, UpdateDecision};
use crate::refresh::RemoteBuckets;
use crate::retry::RetrySlot;
use crate::schema::DynItemSchema;
use chrono::{Duration as ChronoDuration, Utc};
use merc_core::{Currency, Sku};
use merc_pricer::{DynPriceSource, ItemPrice, PriceUpdate, PricerError};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Backoff before re-fetching the key price after a failed resolution.
pub const KEY_PRICE_RETRY_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Result of a name search.
///
/// Deliberately three-way: an ambiguous query is not an error, the
/// caller must disambiguate from the returned names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSearch {
    /// Exactly one entry matched (or one matched exactly).
    One(Box<Entry>),
    /// Two or more entries matched; their display names.
    Many(Vec<String>),
    /// Nothing matched.
    None,
}

/// Case/synonym normalization applied to both queries and names.
fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace("non-craftable", "uncraftable");
    match lowered.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// The pricelist / key-rate reconciliation engine.
pub struct Pricelist {
    config: PricelistConfig,
    pricer: DynPriceSource,
    schema: DynItemSchema,
    inventory: DynInventory,
    /// Insertion-ordered catalog; membership is keyed by resolved name.
    entries: RwLock<Vec<Entry>>,
    /// The catalog-wide key exchange rate. Never observably invalid.
    global_key: RwLock<Option<KeyPrices>>,
    /// Latest raw feed rate, kept even when the global rate is pinned
    /// by a manual override.
    current_key: RwLock<Option<KeyPrices>>,
    bus: EventBus,
    key_retry: RetrySlot,
    /// Back-reference for the scheduled key refetch; set by
    /// [`Pricelist::new_shared`].
    weak_self: RwLock<Weak<Pricelist>>,
}

impl Pricelist {
    pub fn new(
        config: PricelistConfig,
        pricer: DynPriceSource,
        schema: DynItemSchema,
        inventory: DynInventory,
    ) -> Self {
        Self {
            config,
            pricer,
            schema,
            inventory,
            entries: RwLock::new(Vec::new()),
            global_key: RwLock::new(None),
            current_key: RwLock::new(None),
            bus: EventBus::new(),
            key_retry: RetrySlot::new(),
            weak_self: RwLock::new(Weak::new()),
        }
    }

    /// Create a new engine wrapped in Arc for sharing. Required for the
    /// scheduled key-price refetch to re-enter the engine.
    pub fn new_shared(
        config: PricelistConfig,
        pricer: DynPriceSource,
        schema: DynItemSchema,
        inventory: DynInventory,
    ) -> Arc<Self> {
        let engine = Arc::new(Self::new(config, pricer, schema, inventory));
        *engine.weak_self.write() = Arc::downgrade(&engine);
        engine
    }

    /// Subscribe to engine notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PricelistEvent> {
        self.bus.subscribe()
    }

    // --- Key-rate accessors -------------------------------------------------

    /// The current global key exchange rate, if bootstrapped.
    pub fn global_key_prices(&self) -> Option<KeyPrices> {
        self.global_key.read().clone()
    }

    /// The latest raw feed rate, tracked even under a manual override.
    pub fn current_key_prices(&self) -> Option<KeyPrices> {
        self.current_key.read().clone()
    }

    /// Scalar metal value of one key (the global sell side). Falls back
    /// to the placeholder rate before bootstrap so comparisons are
    /// always possible.
    pub fn key_price_metal(&self) -> Decimal {
        self.global_key
            .read()
            .as_ref()
            .map(|rate| rate.sell.metal)
            .unwrap_or_else(|| fallback_key_prices(self.config.pricer.into()).sell.metal)
    }

    // --- Catalog lookups ----------------------------------------------------

    pub fn get_length(&self) -> usize {
        self.entries.read().len()
    }

    /// Snapshot of the whole catalog in insertion order.
    pub fn get_all(&self) -> Vec<Entry> {
        self.entries.read().clone()
    }

    pub fn has_price(&self, sku: &Sku, only_enabled: bool) -> bool {
        let Some(name) = self.schema.display_name(sku) else {
            return false;
        };
        self.entries
            .read()
            .iter()
            .any(|e| e.name == name && (!only_enabled || e.enabled))
    }

    /// Exact lookup by resolved name, returning a snapshot clone.
    ///
    /// With `generics` set, a quality-5 effect variant with no exact
    /// entry falls back to the effect-less generic of the same base
    /// item: the generic is cloned and renamed to the specific effect;
    /// the stored generic is never handed out for a specific sku.
    pub fn get_price(&self, sku: &Sku, only_enabled: bool, generics: bool) -> Option<Entry> {
        let name = self.schema.display_name(sku)?;
        let entries = self.entries.read();

        if let Some(entry) = entries.iter().find(|e| e.name == name) {
            if only_enabled && !entry.enabled {
                return None;
            }
            return Some(entry.clone());
        }

        if generics && sku.has_effect() {
            let generic_name = self.schema.display_name(&sku.base())?;
            if let Some(generic) = entries.iter().find(|e| e.name == generic_name) {
                if only_enabled && !generic.enabled {
                    return None;
                }
                let mut specific = generic.clone();
                specific.sku = sku.clone();
                specific.name = name;
                return Some(specific);
            }
        }

        None
    }

    /// Transactional in-place access to an entry.
    ///
    /// Lookups return clones; this is the one sanctioned way for
    /// collaborators to mutate an entry they looked up.
    pub fn with_entry_mut<T>(
        &self,
        sku: &Sku,
        f: impl FnOnce(&mut Entry) -> T,
    ) -> PricelistResult<T> {
        let mut entries = self.entries.write();
        let entry = entries
            .iter_mut()
            .find(|e| &e.sku == sku)
            .ok_or_else(|| PricelistError::NotFound(sku.clone()))?;
        Ok(f(entry))
    }

    /// Case-insensitive substring search over resolved names.
    pub fn search_by_name(&self, query: &str, enabled_only: bool) -> NameSearch {
        let normalized = normalize_name(query);
        let entries = self.entries.read();

        let matches: Vec<&Entry> = entries
            .iter()
            .filter(|e| !enabled_only || e.enabled)
            .filter(|e| normalize_name(&e.name).contains(&normalized))
            .collect();

        if let Some(exact) = matches
            .iter()
            .find(|e| normalize_name(&e.name) == normalized)
        {
            return NameSearch::One(Box::new((**exact).clone()));
        }

        match matches.as_slice() {
            [] => NameSearch::None,
            [single] => NameSearch::One(Box::new((*single).clone())),
            many => NameSearch::Many(many.iter().map(|e| e.name.clone()).collect()),
        }
    }

    // --- Catalog mutation ---------------------------------------------------

    /// Validate, price (when autopriced) and append a new entry.
    ///
    /// Fails without mutation on shape errors, duplicates, circular key
    /// pricing, spread violations, or price-source errors.
    pub async fn add_price(
        &self,
        data: EntryData,
        emit: bool,
        reason: ChangeReason,
    ) -> PricelistResult<Entry> {
        data.validate()?;
        let name = self.resolve_name(&data.sku)?;
        {
            let entries = self.entries.read();
            if entries.iter().any(|e| e.sku == data.sku || e.name == name) {
                return Err(PricelistError::DuplicateEntry(data.sku));
            }
        }
        check_key_circularity(&data.sku, &data.buy, &data.sell)?;

        let entry = self.resolve_entry(data, name).await?;
        check_key_circularity(&entry.sku, &entry.buy, &entry.sell)?;
        self.check_spread(&entry)?;

        let snapshot = {
            let mut entries = self.entries.write();
            // Re-check under the write lock: an interleaved add for a
            // different sku may have claimed the name meanwhile.
            if entries.iter().any(|e| e.name == entry.name) {
                return Err(PricelistError::DuplicateEntry(entry.sku.clone()));
            }
            entries.push(entry.clone());
            emit.then(|| entries.clone())
        };

        if let Some(snapshot) = snapshot {
            self.bus.emit(PricelistEvent::PriceChanged {
                sku: entry.sku.clone(),
                entry: Box::new(entry.clone()),
            });
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason,
                entries: snapshot,
            });
        }

        info!(sku = %entry.sku, name = %entry.name, "Added pricelist entry");
        Ok(entry)
    }

    /// Atomic replacement of an existing entry: remove (without
    /// emitting), re-resolve the price, append, then emit once.
    pub async fn update_price(
        &self,
        data: EntryData,
        emit: bool,
        reason: ChangeReason,
    ) -> PricelistResult<Entry> {
        data.validate()?;
        let name = self.resolve_name(&data.sku)?;
        {
            let entries = self.entries.read();
            if !entries.iter().any(|e| e.sku == data.sku) {
                return Err(PricelistError::NotFound(data.sku));
            }
        }
        check_key_circularity(&data.sku, &data.buy, &data.sell)?;

        let entry = self.resolve_entry(data, name).await?;
        check_key_circularity(&entry.sku, &entry.buy, &entry.sell)?;
        self.check_spread(&entry)?;

        let snapshot = {
            let mut entries = self.entries.write();
            let idx = entries
                .iter()
                .position(|e| e.sku == entry.sku)
                .ok_or_else(|| PricelistError::NotFound(entry.sku.clone()))?;
            entries.remove(idx);
            entries.push(entry.clone());
            emit.then(|| entries.clone())
        };

        if let Some(snapshot) = snapshot {
            self.bus.emit(PricelistEvent::PriceChanged {
                sku: entry.sku.clone(),
                entry: Box::new(entry.clone()),
            });
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason,
                entries: snapshot,
            });
        }

        info!(sku = %entry.sku, "Updated pricelist entry");
        Ok(entry)
    }

    /// Remove by sku, returning the removed snapshot.
    pub fn remove_price(&self, sku: &Sku, emit: bool) -> PricelistResult<Entry> {
        let (removed, snapshot) = {
            let mut entries = self.entries.write();
            let idx = entries
                .iter()
                .position(|e| &e.sku == sku)
                .ok_or_else(|| PricelistError::NotFound(sku.clone()))?;
            let removed = entries.remove(idx);
            (removed, emit.then(|| entries.clone()))
        };

        if let Some(snapshot) = snapshot {
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason: ChangeReason::Command,
                entries: snapshot,
            });
        }

        info!(sku = %removed.sku, "Removed pricelist entry");
        Ok(removed)
    }

    /// Drop every entry. Emits a single bulk notification.
    pub fn remove_all(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let count = entries.len();
            entries.clear();
            count
        };
        self.bus.emit(PricelistEvent::CatalogChanged {
            reason: ChangeReason::BulkLoad,
            entries: Vec::new(),
        });
        info!(removed, "Cleared pricelist");
        removed
    }

    /// Drop every entry in `group`. Emits one bulk notification when
    /// anything was removed.
    pub fn remove_by_group(&self, group: &str) -> usize {
        let (removed, snapshot) = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|e| e.group.as_deref() != Some(group));
            (before - entries.len(), entries.clone())
        };
        if removed > 0 {
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason: ChangeReason::BulkLoad,
                entries: snapshot,
            });
        }
        info!(removed, group, "Removed pricelist group");
        removed
    }

    /// Replace the whole backing list, then run catalog setup.
    ///
    /// Only a sample entry's shape gates the batch; individually broken
    /// entries are skipped with a warning.
    pub async fn set_pricelist(
        &self,
        items: Vec<EntryData>,
        emit: bool,
    ) -> PricelistResult<()> {
        if let Some(sample) = items.first() {
            sample.validate()?;
        }

        let mut new_entries: Vec<Entry> = Vec::with_capacity(items.len());
        for mut data in items {
            if let Err(e) = data.validate() {
                warn!(sku = %data.sku, error = %e, "Skipping invalid bulk entry");
                continue;
            }
            let Some(name) = self.schema.display_name(&data.sku) else {
                warn!(sku = %data.sku, "Skipping bulk entry for unknown item");
                continue;
            };
            if new_entries.iter().any(|e| e.name == name) {
                warn!(sku = %data.sku, name = %name, "Skipping bulk entry with duplicate name");
                continue;
            }
            if !self.config.premium {
                data.promoted = 0;
            }
            new_entries.push(Entry::new(data, name));
        }

        let snapshot = {
            let mut entries = self.entries.write();
            *entries = new_entries;
            entries.clone()
        };
        info!(entry_count = snapshot.len(), "Loaded pricelist");
        if emit {
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason: ChangeReason::BulkLoad,
                entries: snapshot,
            });
        }

        self.setup_pricelist().await
    }

    // --- Bootstrap ----------------------------------------------------------

    /// Resolve the global key rate and refresh stale entries.
    ///
    /// Runs at startup and after bulk replacement. A failed or invalid
    /// key fetch degrades to the temporary-rate fallback instead of
    /// aborting; a failed catalog pull propagates.
    pub async fn setup_pricelist(&self) -> PricelistResult<()> {
        self.bootstrap_key_rate().await;
        self.update_old_prices().await?;
        Ok(())
    }

    async fn bootstrap_key_rate(&self) {
        let key_sku = Sku::key();
        let key_entry = self.get_price(&key_sku, false, false);

        let fetched = match self.pricer.get_price(&key_sku).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, "Key price fetch failed, using temporary key prices");
                self.use_temporary_key_prices(key_entry.as_ref());
                return;
            }
        };

        // An internally valid manual key price wins over the feed.
        let manual_rate = key_entry
            .as_ref()
            .filter(|e| !e.autoprice)
            .and_then(|e| {
                e.price_pair()
                    .filter(|pair| is_valid_key_price(&pair.buy, &pair.sell))
                    .map(|pair| KeyPrices {
                        buy: pair.buy,
                        sell: pair.sell,
                        src: KeySource::Manual,
                        time: e.time,
                    })
            });

        if let Some(rate) = manual_rate {
            info!(rate = %rate, "Using manually priced key entry as global key rate");
            *self.global_key.write() = Some(rate);
            if is_valid_key_price(&fetched.buy, &fetched.sell) {
                *self.current_key.write() = Some(KeyPrices {
                    buy: fetched.buy,
                    sell: fetched.sell,
                    src: self.config.pricer.into(),
                    time: Some(fetched.time),
                });
            }
            self.key_retry.cancel();
            return;
        }

        if !is_valid_key_price(&fetched.buy, &fetched.sell) {
            error!(
                buy = %fetched.buy,
                sell = %fetched.sell,
                "Fetched key price violates the key pricing invariant"
            );
            self.use_temporary_key_prices(key_entry.as_ref());
            return;
        }

        let rate = KeyPrices {
            buy: fetched.buy,
            sell: fetched.sell,
            src: self.config.pricer.into(),
            time: Some(fetched.time),
        };
        info!(rate = %rate, "Key rate resolved from price source");
        *self.global_key.write() = Some(rate.clone());
        *self.current_key.write() = Some(rate);

        // An autopriced key entry follows the freshly fetched rate.
        if key_entry.as_ref().map(|e| e.autoprice).unwrap_or(false) {
            let updated = self.with_entry_mut(&key_sku, |entry| {
                entry.buy = Some(fetched.buy);
                entry.sell = Some(fetched.sell);
                entry.time = Some(fetched.time);
                entry.clone()
            });
            if let Ok(entry) = updated {
                self.bus.emit(PricelistEvent::PriceChanged {
                    sku: entry.sku.clone(),
                    entry: Box::new(entry),
                });
            }
        }
        self.key_retry.cancel();
    }

    /// Fall back to a usable key rate when the source cannot supply
    /// one. The engine is never left without a rate, at the cost of
    /// temporary inaccuracy.
    fn use_temporary_key_prices(&self, key_entry: Option<&Entry>) {
        if self.global_key.read().is_some() {
            // Keep the last-known-good rate and try again later.
            self.schedule_key_retry();
            return;
        }

        let catalog_rate = key_entry.and_then(|e| {
            e.price_pair()
                .filter(|pair| is_valid_key_price(&pair.buy, &pair.sell))
                .map(|pair| KeyPrices {
                    buy: pair.buy,
                    sell: pair.sell,
                    // No refresh timestamp means an operator set it.
                    src: if e.time.is_none() {
                        KeySource::Manual
                    } else {
                        self.config.pricer.into()
                    },
                    time: e.time,
                })
        });

        match catalog_rate {
            Some(rate) => {
                info!(rate = %rate, "Adopting catalog key entry as temporary key rate");
                *self.global_key.write() = Some(rate.clone());
                *self.current_key.write() = Some(rate);
            }
            None => {
                let rate = fallback_key_prices(self.config.pricer.into());
                warn!(rate = %rate, "No usable key price anywhere, using placeholder");
                *self.global_key.write() = Some(rate.clone());
                *self.current_key.write() = Some(rate);
                self.schedule_key_retry();
            }
        }
    }

    fn schedule_key_retry(&self) {
        let weak = self.weak_self.read().clone();
        if weak.upgrade().is_none() {
            warn!("Key price refetch not scheduled: engine was not created shared");
            return;
        }
        info!(
            retry_in_secs = KEY_PRICE_RETRY_INTERVAL.as_secs(),
            "Scheduling key price refetch"
        );
        self.key_retry.schedule(KEY_PRICE_RETRY_INTERVAL, async move {
            let Some(engine) = weak.upgrade() else {
                return;
            };
            info!("Retrying key price fetch");
            engine.bootstrap_key_rate().await;
        });
    }

    /// True iff a key-price refetch is pending.
    pub fn key_retry_scheduled(&self) -> bool {
        self.key_retry.is_scheduled()
    }

    // --- Stale refresh ------------------------------------------------------

    /// Pull the full remote catalog once and fold newer prices into
    /// every stale, autopriced entry. Returns how many entries changed.
    pub async fn update_old_prices(&self) -> PricelistResult<usize> {
        let remote = self.pricer.get_pricelist().await?;
        let mut buckets = RemoteBuckets::build(remote);

        let now = Utc::now();
        let max_age = self.config.max_age_secs;
        let key_rate = self.key_price_metal();
        let mut changed = 0usize;

        let snapshot = {
            let mut entries = self.entries.write();
            for entry in entries.iter_mut() {
                if !entry.autoprice {
                    continue;
                }
                let stale = max_age <= 0
                    || entry
                        .time
                        .map(|t| t + ChronoDuration::seconds(max_age) <= now)
                        .unwrap_or(true);
                if !stale {
                    continue;
                }

                let Some(remote_item) = buckets
                    .take_match((entry.sku.quality, entry.sku.killstreak), |item| {
                        self.schema.display_name(&item.sku).as_deref() == Some(entry.name.as_str())
                    })
                else {
                    continue;
                };

                let newer = entry
                    .time
                    .map(|t| remote_item.time > t)
                    .unwrap_or(true);
                if !newer {
                    continue;
                }

                let in_stock = self.inventory.stock_count(&entry.sku) > 0;
                let decision = partial::decide(
                    entry,
                    &remote_item,
                    key_rate,
                    in_stock,
                    &self.config.partial_update,
                );
                if apply_decision(entry, &decision, &remote_item) {
                    trace!(sku = %entry.sku, ?decision, "Refreshed stale price");
                    changed += 1;
                }
            }
            (changed > 0).then(|| entries.clone())
        };

        if let Some(snapshot) = snapshot {
            self.bus.emit(PricelistEvent::CatalogChanged {
                reason: ChangeReason::Reconciliation,
                entries: snapshot,
            });
        }
        info!(changed, "Stale price refresh complete");
        Ok(changed)
    }

    // --- Live feed ----------------------------------------------------------

    /// Fold one unsolicited price-change notification into the catalog
    /// and the key-rate bookkeeping.
    pub fn handle_price_change(&self, update: &PriceUpdate) {
        if update.source != self.config.pricer.id() {
            trace!(source = %update.source, "Ignoring notification from foreign pricer");
            return;
        }

        if update.sku.is_key() && !self.handle_key_notification(update) {
            return;
        }

        let remote = update.as_item_price();
        let key_rate = self.key_price_metal();
        let in_stock = self.inventory.stock_count(&update.sku) > 0;
        let Some(name) = self.schema.display_name(&update.sku) else {
            return;
        };

        let mut events: Vec<PricelistEvent> = Vec::new();
        {
            let mut entries = self.entries.write();
            let Some(entry) = entries.iter_mut().find(|e| e.name == name) else {
                return;
            };
            if !entry.autoprice {
                return;
            }

            let before = entry.price_pair();
            let decision = partial::decide(
                entry,
                &remote,
                key_rate,
                in_stock,
                &self.config.partial_update,
            );
            if matches!(decision, UpdateDecision::Keep) {
                return;
            }
            apply_decision(entry, &decision, &remote);

            match decision {
                UpdateDecision::Partial { .. } => {
                    if let (Some(old), Some(current)) = (before, entry.price_pair()) {
                        events.push(PricelistEvent::PartialPriceApplied {
                            sku: entry.sku.clone(),
                            old,
                            current,
                            remote: PricePair {
                                buy: remote.buy,
                                sell: remote.sell,
                            },
                        });
                    }
                }
                UpdateDecision::Overwrite => {
                    events.push(PricelistEvent::PriceChanged {
                        sku: entry.sku.clone(),
                        entry: Box::new(entry.clone()),
                    });
                    let after = PricePair {
                        buy: remote.buy,
                        sell: remote.sell,
                    };
                    let stock = self.inventory.stock_count(&entry.sku);
                    events.push(PricelistEvent::CatalogChanged {
                        reason: ChangeReason::Reconciliation,
                        entries: entries.clone(),
                    });
                    if self.config.broadcast_price_updates {
                        events.push(PricelistEvent::PriceRefreshed {
                            sku: update.sku.clone(),
                            before,
                            after,
                            stock,
                        });
                    }
                }
                UpdateDecision::Keep => {}
            }
        }

        for event in events {
            self.bus.emit(event);
        }
    }

    /// Key-rate bookkeeping for a key-item notification. Returns false
    /// when the notification must be dropped entirely.
    fn handle_key_notification(&self, update: &PriceUpdate) -> bool {
        let candidate = KeyPrices {
            buy: update.buy,
            sell: update.sell,
            src: self.config.pricer.into(),
            time: Some(update.time),
        };
        if !candidate.is_valid() {
            warn!(
                buy = %update.buy,
                sell = %update.sell,
                "Rejected key rate from feed: key pricing invariant violated"
            );
            return false;
        }

        let key_entry = self.get_price(&update.sku, false, false);
        let follow = match &key_entry {
            None => true,
            Some(entry) if entry.autoprice => true,
            Some(_) => {
                // A manually priced key still follows the feed while
                // autokeys scrap adjustment is active and the global
                // rate has not been hand-overridden since the last
                // feed value.
                self.config.autokeys_scrap_adjustment && {
                    let global = self.global_key.read();
                    let current = self.current_key.read();
                    matches!(
                        (global.as_ref(), current.as_ref()),
                        (Some(g), Some(c)) if g.same_rate(c)
                    )
                }
            }
        };

        if follow {
            debug!(rate = %candidate, "Global key rate follows the feed");
            *self.global_key.write() = Some(candidate.clone());
        }
        *self.current_key.write() = Some(candidate);
        true
    }

    // --- Internals ----------------------------------------------------------

    fn resolve_name(&self, sku: &Sku) -> PricelistResult<String> {
        self.schema
            .display_name(sku)
            .ok_or_else(|| PricelistError::Validation(format!("unknown item: {sku}")))
    }

    /// Resolve the final entry: fetch the price when autopriced, apply
    /// the premium gate, construct.
    async fn resolve_entry(&self, mut data: EntryData, name: String) -> PricelistResult<Entry> {
        if !self.config.premium {
            data.promoted = 0;
        }
        if data.autoprice {
            let fetched = match self.pricer.get_price(&data.sku).await {
                Ok(fetched) => fetched,
                Err(PricerError::NotFound(sku)) => {
                    // Ask the source to price it; a later feed
                    // notification will carry the result.
                    if let Err(e) = self.pricer.request_check(&sku).await {
                        debug!(%sku, error = %e, "Price check request failed");
                    }
                    return Err(PricerError::NotFound(sku).into());
                }
                Err(e) => return Err(e.into()),
            };
            data.buy = Some(fetched.buy);
            data.sell = Some(fetched.sell);
            data.time = Some(fetched.time.timestamp());
        }
        Ok(Entry::new(data, name))
    }

    /// Sell must exceed buy under the current key rate for anything the
    /// bot may end up selling.
    fn check_spread(&self, entry: &Entry) -> PricelistResult<()> {
        let Some(pair) = entry.price_pair() else {
            return Ok(());
        };
        if entry.intent == Intent::Buy && !entry.sku.is_key() {
            return Ok(());
        }
        let rate = self.key_price_metal();
        if pair.sell.to_value(rate) <= pair.buy.to_value(rate) {
            return Err(PricelistError::Validation(format!(
                "{}: sell price ({}) must exceed buy price ({})",
                entry.sku, pair.sell, pair.buy
            )));
        }
        Ok(())
    }
}

/// The key item must never be priced partly in keys.
fn check_key_circularity(
    sku: &Sku,
    buy: &Option<Currency>,
    sell: &Option<Currency>,
) -> PricelistResult<()> {
    if !sku.is_key() {
        return Ok(());
    }
    let circular = matches!(buy, Some(c) if c.keys > 0) || matches!(sell, Some(c) if c.keys > 0);
    if circular {
        return Err(PricelistError::KeyPricingInvariant(
            "key price must not be expressed in keys".to_string(),
        ));
    }
    Ok(())
}

/// Fold an [`UpdateDecision`] into an entry. Returns true iff the entry
/// changed.
fn apply_decision(entry: &mut Entry, decision: &UpdateDecision, remote: &ItemPrice) -> bool {
    match decision {
        UpdateDecision::Overwrite => {
            entry.buy = Some(remote.buy);
            entry.sell = Some(remote.sell);
            entry.time = Some(remote.time);
            true
        }
        UpdateDecision::Partial { buy, sell } => {
            if let Some(buy) = buy {
                entry.buy = Some(*buy);
            }
            if let Some(sell) = sell {
                entry.sell = Some(*sell);
            }
            entry.group = Some(PARTIAL_PRICED_GROUP.to_string());
            // The refresh timestamp stays put so the entry remains due
            // for another look.
            true
        }
        UpdateDecision::Keep => false,
    }
}
