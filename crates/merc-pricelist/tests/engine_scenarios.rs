//! End-to-end engine tests: catalog invariants, key-rate bootstrap,
//! stale refresh and live-feed reconciliation against a mock price
//! source.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use merc_core::{Currency, Sku};
use merc_pricer::{ItemPrice, MockPriceSource, PriceUpdate, PricerKind};
use merc_pricelist::{
    ChangeReason, EntryData, InMemoryInventory, Intent, KeySource, MapSchema, NameSearch,
    PartialUpdateConfig, Pricelist, PricelistConfig, PricelistError, PricelistEvent,
    PARTIAL_PRICED_GROUP,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn test_schema() -> Arc<MapSchema> {
    Arc::new(
        MapSchema::new()
            .with_item(5021, "Mann Co. Supply Crate Key")
            .with_item(200, "Ellis' Cap")
            .with_item(378, "The Team Captain")
            .with_item(30469, "Patriot Peak")
            .with_effect(703, "Cool"),
    )
}

struct Harness {
    engine: Arc<Pricelist>,
    pricer: Arc<MockPriceSource>,
    inventory: Arc<InMemoryInventory>,
}

fn harness(config: PricelistConfig) -> Harness {
    let pricer = Arc::new(MockPriceSource::new());
    let inventory = InMemoryInventory::new_shared();
    let engine = Pricelist::new_shared(
        config,
        pricer.clone(),
        test_schema(),
        inventory.clone(),
    );
    Harness {
        engine,
        pricer,
        inventory,
    }
}

fn partial_config() -> PricelistConfig {
    PricelistConfig {
        partial_update: PartialUpdateConfig {
            enabled: true,
            threshold_secs: 3600,
            exclude_skus: Vec::new(),
        },
        ..PricelistConfig::default()
    }
}

fn metal(value: Decimal) -> Currency {
    Currency::from_metal(value)
}

fn manual_entry(sku: &str, buy: Decimal, sell: Decimal) -> EntryData {
    let mut data = EntryData::new(sku.parse().unwrap());
    data.autoprice = false;
    data.buy = Some(metal(buy));
    data.sell = Some(metal(sell));
    data
}

fn remote_price(sku: &str, buy: Decimal, sell: Decimal, time: DateTime<Utc>) -> ItemPrice {
    ItemPrice {
        sku: sku.parse().unwrap(),
        buy: metal(buy),
        sell: metal(sell),
        time,
    }
}

fn feed_update(sku: &str, buy: Decimal, sell: Decimal, time: DateTime<Utc>) -> PriceUpdate {
    PriceUpdate {
        sku: sku.parse().unwrap(),
        buy: metal(buy),
        sell: metal(sell),
        time,
        source: PricerKind::PricesTf.id().to_string(),
    }
}

// --- Catalog invariants ------------------------------------------------

#[tokio::test]
async fn add_rejects_duplicate_sku() {
    let h = harness(PricelistConfig::default());

    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap();

    let err = h
        .engine
        .add_price(manual_entry("200;6", dec!(5), dec!(7)), false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::DuplicateEntry(_)));
    assert_eq!(h.engine.get_length(), 1);
}

#[tokio::test]
async fn add_rejects_inverted_spread_without_mutation() {
    let h = harness(PricelistConfig::default());

    let err = h
        .engine
        .add_price(manual_entry("200;6", dec!(8), dec!(6)), false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::Validation(_)));
    assert_eq!(h.engine.get_length(), 0);

    // Buy-only intent is exempt from the spread check...
    let mut buy_only = manual_entry("200;6", dec!(8), dec!(6));
    buy_only.intent = Intent::Buy;
    h.engine
        .add_price(buy_only, false, ChangeReason::Command)
        .await
        .unwrap();

    // ...but the key item never is.
    let mut key = manual_entry("5021;6", dec!(60), dec!(50));
    key.intent = Intent::Buy;
    let err = h
        .engine
        .add_price(key, false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::Validation(_)));
}

#[tokio::test]
async fn key_priced_in_keys_is_circular() {
    let h = harness(PricelistConfig::default());

    let mut data = EntryData::new(Sku::key());
    data.autoprice = false;
    data.buy = Some(Currency::new(1, Decimal::ZERO));
    data.sell = Some(metal(dec!(60)));

    let err = h
        .engine
        .add_price(data, false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::KeyPricingInvariant(_)));
    assert_eq!(h.engine.get_length(), 0);
}

#[tokio::test]
async fn remove_missing_never_mutates() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap();

    let missing: Sku = "378;6".parse().unwrap();
    assert!(matches!(
        h.engine.remove_price(&missing, false),
        Err(PricelistError::NotFound(_))
    ));
    assert_eq!(h.engine.get_length(), 1);

    // Removing an existing entry returns its snapshot.
    let removed = h
        .engine
        .remove_price(&"200;6".parse().unwrap(), false)
        .unwrap();
    assert_eq!(removed.name, "Ellis' Cap");
    assert_eq!(h.engine.get_length(), 0);
}

#[tokio::test]
async fn add_emits_price_and_catalog_changed_in_order() {
    let h = harness(PricelistConfig::default());
    let mut rx = h.engine.subscribe();

    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), true, ChangeReason::Command)
        .await
        .unwrap();

    match rx.try_recv().unwrap() {
        PricelistEvent::PriceChanged { sku, entry } => {
            assert_eq!(sku.to_string(), "200;6");
            assert_eq!(entry.name, "Ellis' Cap");
        }
        other => panic!("expected PriceChanged, got {other:?}"),
    }
    match rx.try_recv().unwrap() {
        PricelistEvent::CatalogChanged { reason, entries } => {
            assert_eq!(reason, ChangeReason::Command);
            assert_eq!(entries.len(), 1);
        }
        other => panic!("expected CatalogChanged, got {other:?}"),
    }
}

#[tokio::test]
async fn autopriced_add_uses_source_and_requests_check_when_unknown() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), t0()));

    let entry = h
        .engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(6))));
    assert_eq!(entry.time, Some(t0()));

    // Unknown to the source: propagate the failure, fire a re-check.
    let err = h
        .engine
        .add_price(EntryData::new("378;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::PriceSource(_)));
    assert_eq!(h.engine.get_length(), 1);
    assert_eq!(h.pricer.check_requests(), vec!["378;6".parse::<Sku>().unwrap()]);
}

#[tokio::test]
async fn update_replaces_atomically() {
    let h = harness(PricelistConfig::default());

    let missing = h
        .engine
        .update_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(missing, PricelistError::NotFound(_)));

    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap();
    let updated = h
        .engine
        .update_price(manual_entry("200;6", dec!(7), dec!(9)), false, ChangeReason::Command)
        .await
        .unwrap();
    assert_eq!(updated.buy, Some(metal(dec!(7))));
    assert_eq!(h.engine.get_length(), 1);

    // A failing update leaves the previous entry in place.
    let err = h
        .engine
        .update_price(manual_entry("200;6", dec!(9), dec!(7)), false, ChangeReason::Command)
        .await
        .unwrap_err();
    assert!(matches!(err, PricelistError::Validation(_)));
    let kept = h
        .engine
        .get_price(&"200;6".parse().unwrap(), false, false)
        .unwrap();
    assert_eq!(kept.buy, Some(metal(dec!(7))));
}

// --- Name search (scenario 5) ------------------------------------------

#[tokio::test]
async fn search_normalizes_the_prefix() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("378;6", dec!(10), dec!(12)), false, ChangeReason::Command)
        .await
        .unwrap();

    match h.engine.search_by_name("team captain", false) {
        NameSearch::One(entry) => assert_eq!(entry.name, "The Team Captain"),
        other => panic!("expected a direct match, got {other:?}"),
    }
}

#[tokio::test]
async fn search_is_three_way() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("378;6", dec!(10), dec!(12)), false, ChangeReason::Command)
        .await
        .unwrap();
    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap();

    assert!(matches!(
        h.engine.search_by_name("nonexistent", false),
        NameSearch::None
    ));
    // "cap" is a substring of both names.
    match h.engine.search_by_name("cap", false) {
        NameSearch::Many(names) => assert_eq!(names.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    // An exact normalized match wins over ambiguity.
    match h.engine.search_by_name("ellis' cap", false) {
        NameSearch::One(entry) => assert_eq!(entry.name, "Ellis' Cap"),
        other => panic!("expected a direct match, got {other:?}"),
    }

    // Disabled entries can be filtered out.
    h.engine
        .with_entry_mut(&"200;6".parse().unwrap(), |e| e.enabled = false)
        .unwrap();
    match h.engine.search_by_name("cap", true) {
        NameSearch::One(entry) => assert_eq!(entry.name, "The Team Captain"),
        other => panic!("expected a single match, got {other:?}"),
    }
}

// --- Generic fallback ----------------------------------------------------

#[tokio::test]
async fn generic_fallback_clones_and_renames() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("30469;5", dec!(20), dec!(25)), false, ChangeReason::Command)
        .await
        .unwrap();

    // No exact entry for the effect variant without fallback.
    let specific: Sku = "30469;5;u703".parse().unwrap();
    assert!(h.engine.get_price(&specific, false, false).is_none());

    let derived = h.engine.get_price(&specific, false, true).unwrap();
    assert_eq!(derived.sku, specific);
    assert_eq!(derived.name, "Cool Patriot Peak");
    assert_eq!(derived.sell, Some(metal(dec!(25))));

    // The stored generic is untouched.
    let stored = h.engine.get_price(&"30469;5".parse().unwrap(), false, false).unwrap();
    assert_eq!(stored.name, "Unusual Patriot Peak");
    assert_eq!(h.engine.get_length(), 1);
}

// --- Key-rate bootstrap (scenarios 1 and 2) -----------------------------

#[tokio::test]
async fn manual_key_entry_wins_over_feed() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("5021;6", dec!(50), dec!(60)), false, ChangeReason::Command)
        .await
        .unwrap();
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));

    h.engine.setup_pricelist().await.unwrap();

    let global = h.engine.global_key_prices().unwrap();
    assert_eq!(global.buy, metal(dec!(50)));
    assert_eq!(global.sell, metal(dec!(60)));
    assert_eq!(global.src, KeySource::Manual);

    // The raw feed rate is still cached alongside the pinned global.
    let current = h.engine.current_key_prices().unwrap();
    assert_eq!(current.buy, metal(dec!(56.11)));
    assert_eq!(h.engine.key_price_metal(), dec!(60));
}

#[tokio::test(start_paused = true)]
async fn invalid_remote_key_rate_falls_back_and_retries() {
    let h = harness(PricelistConfig::default());
    // Invalid: buy side expressed in keys.
    h.pricer.set_price(ItemPrice {
        sku: Sku::key(),
        buy: Currency::new(1, Decimal::ZERO),
        sell: metal(dec!(60)),
        time: t0(),
    });

    h.engine.setup_pricelist().await.unwrap();

    // Placeholder on first boot; always valid; retry pending.
    let global = h.engine.global_key_prices().unwrap();
    assert!(global.is_valid());
    assert!(h.engine.key_retry_scheduled());

    // The source recovers; the scheduled refetch installs the real rate.
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    tokio::time::sleep(Duration::from_secs(15 * 60 + 1)).await;

    let global = h.engine.global_key_prices().unwrap();
    assert_eq!(global.sell, metal(dec!(56.77)));
    assert_eq!(global.src, KeySource::Ptf);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_keeps_last_known_good_rate() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    h.engine.setup_pricelist().await.unwrap();
    assert_eq!(h.engine.key_price_metal(), dec!(56.77));

    h.pricer.set_failing(true);
    // The catalog pull fails too; setup propagates that, but the key
    // rate must survive.
    assert!(h.engine.setup_pricelist().await.is_err());

    let global = h.engine.global_key_prices().unwrap();
    assert_eq!(global.sell, metal(dec!(56.77)));
    assert!(h.engine.key_retry_scheduled());
}

#[tokio::test]
async fn valid_catalog_key_entry_backs_failed_fetch() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("5021;6", dec!(50), dec!(60)), false, ChangeReason::Command)
        .await
        .unwrap();
    h.pricer.set_failing(true);

    let _ = h.engine.setup_pricelist().await;

    let global = h.engine.global_key_prices().unwrap();
    assert_eq!(global.buy, metal(dec!(50)));
    // No timestamp on the entry means an operator set it.
    assert_eq!(global.src, KeySource::Manual);
}

#[tokio::test]
async fn autopriced_key_entry_follows_fetched_rate() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    h.engine
        .add_price(EntryData::new(Sku::key()), false, ChangeReason::Command)
        .await
        .unwrap();

    // Fresh fetch with a newer rate.
    let t1 = t0() + ChronoDuration::seconds(600);
    h.pricer
        .set_price(remote_price("5021;6", dec!(57.11), dec!(57.88), t1));
    h.engine.setup_pricelist().await.unwrap();

    assert_eq!(h.engine.key_price_metal(), dec!(57.88));
    let entry = h.engine.get_price(&Sku::key(), false, false).unwrap();
    assert_eq!(entry.sell, Some(metal(dec!(57.88))));
    assert_eq!(entry.time, Some(t1));
}

// --- Live feed (scenarios 3 and 4) ---------------------------------------

async fn seeded_feed_harness() -> Harness {
    let h = harness(partial_config());
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), t0()));
    h.engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();
    h.inventory.set_stock("200;6".parse().unwrap(), 2);
    h
}

#[tokio::test]
async fn feed_overwrite_when_diff_non_negative() {
    let h = seeded_feed_harness().await;
    let mut rx = h.engine.subscribe();

    // new sell (7) - old buy (6) >= 0 and not partial-priced: overwrite.
    let t1 = t0() + ChronoDuration::seconds(100);
    h.engine
        .handle_price_change(&feed_update("200;6", dec!(5), dec!(7), t1));

    let entry = h.engine.get_price(&"200;6".parse().unwrap(), false, false).unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(5))));
    assert_eq!(entry.sell, Some(metal(dec!(7))));
    assert_eq!(entry.time, Some(t1));
    assert!(!entry.is_partial_priced());

    assert!(matches!(
        rx.try_recv().unwrap(),
        PricelistEvent::PriceChanged { .. }
    ));
    assert!(matches!(
        rx.try_recv().unwrap(),
        PricelistEvent::CatalogChanged { .. }
    ));
    // Broadcasting is off by default.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn feed_partial_update_keeps_sell_and_time() {
    let h = seeded_feed_harness().await;
    let mut rx = h.engine.subscribe();

    // new sell (5.5) - old buy (6) < 0: partial path. new buy (5) < old
    // sell (8): adopt buy only; sell and time stay.
    let t1 = t0() + ChronoDuration::seconds(100);
    h.engine
        .handle_price_change(&feed_update("200;6", dec!(5), dec!(5.5), t1));

    let entry = h.engine.get_price(&"200;6".parse().unwrap(), false, false).unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(5))));
    assert_eq!(entry.sell, Some(metal(dec!(8))));
    assert_eq!(entry.time, Some(t0()));
    assert_eq!(entry.group.as_deref(), Some(PARTIAL_PRICED_GROUP));

    match rx.try_recv().unwrap() {
        PricelistEvent::PartialPriceApplied {
            old,
            current,
            remote,
            ..
        } => {
            assert_eq!(old.buy, metal(dec!(6)));
            assert_eq!(current.buy, metal(dec!(5)));
            assert_eq!(current.sell, metal(dec!(8)));
            assert_eq!(remote.sell, metal(dec!(5.5)));
        }
        other => panic!("expected PartialPriceApplied, got {other:?}"),
    }
    // No price-changed/catalog-changed for a partial adjustment.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn feed_overwrite_broadcasts_with_stock_context_when_configured() {
    let mut config = partial_config();
    config.broadcast_price_updates = true;
    let h = harness(config);
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), t0()));
    h.engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();
    h.inventory.set_stock("200;6".parse().unwrap(), 2);
    let mut rx = h.engine.subscribe();

    let t1 = t0() + ChronoDuration::seconds(100);
    h.engine
        .handle_price_change(&feed_update("200;6", dec!(5), dec!(7), t1));

    assert!(matches!(rx.try_recv().unwrap(), PricelistEvent::PriceChanged { .. }));
    assert!(matches!(rx.try_recv().unwrap(), PricelistEvent::CatalogChanged { .. }));
    match rx.try_recv().unwrap() {
        PricelistEvent::PriceRefreshed { before, after, stock, .. } => {
            assert_eq!(before.unwrap().buy, metal(dec!(6)));
            assert_eq!(after.sell, metal(dec!(7)));
            assert_eq!(stock, 2);
        }
        other => panic!("expected PriceRefreshed, got {other:?}"),
    }
}

#[tokio::test]
async fn feed_ignores_foreign_sources_and_manual_entries() {
    let h = seeded_feed_harness().await;

    let mut foreign = feed_update("200;6", dec!(1), dec!(2), t0() + ChronoDuration::seconds(50));
    foreign.source = "custom".to_string();
    h.engine.handle_price_change(&foreign);

    let entry = h.engine.get_price(&"200;6".parse().unwrap(), false, false).unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(6))));

    // Manually priced entries never follow the feed.
    let h = harness(partial_config());
    h.engine
        .add_price(manual_entry("200;6", dec!(6), dec!(8)), false, ChangeReason::Command)
        .await
        .unwrap();
    h.engine
        .handle_price_change(&feed_update("200;6", dec!(1), dec!(2), t0()));
    let entry = h.engine.get_price(&"200;6".parse().unwrap(), false, false).unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(6))));
}

#[tokio::test]
async fn feed_key_notification_updates_rate_and_cache() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    h.engine.setup_pricelist().await.unwrap();

    // No key catalog entry: the global rate follows the feed.
    let t1 = t0() + ChronoDuration::seconds(60);
    h.engine
        .handle_price_change(&feed_update("5021;6", dec!(57.11), dec!(57.99), t1));
    assert_eq!(h.engine.key_price_metal(), dec!(57.99));

    // An invalid rate is rejected outright; both rates survive.
    let mut invalid = feed_update("5021;6", dec!(0), dec!(58.99), t1);
    invalid.buy = Currency::new(1, Decimal::ZERO);
    h.engine.handle_price_change(&invalid);
    assert_eq!(h.engine.key_price_metal(), dec!(57.99));
    assert_eq!(h.engine.current_key_prices().unwrap().sell, metal(dec!(57.99)));
}

#[tokio::test]
async fn feed_key_pinned_by_manual_entry_still_tracks_cache() {
    let h = harness(PricelistConfig::default());
    h.engine
        .add_price(manual_entry("5021;6", dec!(50), dec!(60)), false, ChangeReason::Command)
        .await
        .unwrap();
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    h.engine.setup_pricelist().await.unwrap();
    assert_eq!(h.engine.key_price_metal(), dec!(60));

    let t1 = t0() + ChronoDuration::seconds(60);
    h.engine
        .handle_price_change(&feed_update("5021;6", dec!(57.11), dec!(57.99), t1));

    // Global stays pinned to the manual price, the cache follows.
    assert_eq!(h.engine.key_price_metal(), dec!(60));
    assert_eq!(h.engine.current_key_prices().unwrap().sell, metal(dec!(57.99)));
}

// --- Stale refresh --------------------------------------------------------

#[tokio::test]
async fn stale_refresh_applies_newer_remote_prices() {
    let h = harness(PricelistConfig::default());
    // t0 is hours in the past, so the entry is stale under the default
    // max age.
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), t0()));
    h.engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();

    let t1 = Utc::now();
    h.pricer
        .set_price(remote_price("200;6", dec!(7), dec!(9), t1));

    let changed = h.engine.update_old_prices().await.unwrap();
    assert_eq!(changed, 1);

    let entry = h.engine.get_price(&"200;6".parse().unwrap(), false, false).unwrap();
    assert_eq!(entry.buy, Some(metal(dec!(7))));
    assert_eq!(entry.sell, Some(metal(dec!(9))));
}

#[tokio::test]
async fn stale_refresh_skips_fresh_and_older_remote() {
    let h = harness(PricelistConfig::default());
    let fresh = Utc::now();
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), fresh));
    h.engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();

    // Entry was just refreshed: not stale, nothing to do.
    let changed = h.engine.update_old_prices().await.unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn stale_refresh_emits_one_bulk_notification() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("200;6", dec!(6), dec!(8), t0()));
    h.pricer
        .set_price(remote_price("378;6", dec!(10), dec!(12), t0()));
    h.engine
        .add_price(EntryData::new("200;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();
    h.engine
        .add_price(EntryData::new("378;6".parse().unwrap()), false, ChangeReason::Command)
        .await
        .unwrap();

    let t1 = Utc::now();
    h.pricer
        .set_price(remote_price("200;6", dec!(7), dec!(9), t1));
    h.pricer
        .set_price(remote_price("378;6", dec!(11), dec!(13), t1));

    let mut rx = h.engine.subscribe();
    let changed = h.engine.update_old_prices().await.unwrap();
    assert_eq!(changed, 2);

    assert!(matches!(
        rx.try_recv().unwrap(),
        PricelistEvent::CatalogChanged { reason: ChangeReason::Reconciliation, .. }
    ));
    assert!(rx.try_recv().is_err());
}

// --- Bulk load -------------------------------------------------------------

#[tokio::test]
async fn set_pricelist_replaces_and_bootstraps() {
    let h = harness(PricelistConfig::default());
    h.pricer
        .set_price(remote_price("5021;6", dec!(56.11), dec!(56.77), t0()));
    h.engine
        .add_price(manual_entry("378;6", dec!(10), dec!(12)), false, ChangeReason::Command)
        .await
        .unwrap();

    let batch = vec![
        manual_entry("200;6", dec!(6), dec!(8)),
        // Unknown item: skipped, not fatal.
        manual_entry("99999;6", dec!(1), dec!(2)),
    ];
    h.engine.set_pricelist(batch, true).await.unwrap();

    assert_eq!(h.engine.get_length(), 1);
    assert!(h.engine.has_price(&"200;6".parse().unwrap(), false));
    assert!(!h.engine.has_price(&"378;6".parse().unwrap(), false));
    // Bootstrap ran: the key rate is resolved from the source.
    assert_eq!(h.engine.key_price_metal(), dec!(56.77));
}

#[tokio::test]
async fn set_pricelist_validates_sample_shape() {
    let h = harness(PricelistConfig::default());

    let mut bad = manual_entry("200;6", dec!(6), dec!(8));
    bad.sell = None; // mismatched pair
    let err = h.engine.set_pricelist(vec![bad], false).await.unwrap_err();
    assert!(matches!(err, PricelistError::Validation(_)));
    assert_eq!(h.engine.get_length(), 0);
}
