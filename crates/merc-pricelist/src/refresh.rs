//! Remote catalog bucketing for the stale-price refresh.
//!
//! One full pricelist pull is bucketed by (quality, killstreak) so each
//! stale local entry scans only its own bucket instead of the whole
//! remote catalog.

use merc_core::KillstreakTier;
use merc_pricer::ItemPrice;
use std::collections::HashMap;

pub(crate) type BucketKey = (u8, KillstreakTier);

/// Remote catalog bucketed by item identity class.
#[derive(Debug)]
pub(crate) struct RemoteBuckets {
    buckets: HashMap<BucketKey, Vec<ItemPrice>>,
}

impl RemoteBuckets {
    pub(crate) fn build(items: Vec<ItemPrice>) -> Self {
        let mut buckets: HashMap<BucketKey, Vec<ItemPrice>> = HashMap::new();
        for item in items {
            buckets
                .entry((item.sku.quality, item.sku.killstreak))
                .or_default()
                .push(item);
        }
        Self { buckets }
    }

    /// Remove and return the first bucket item matching `predicate`.
    ///
    /// Matched items are consumed so each remote price is applied at
    /// most once per pass.
    pub(crate) fn take_match(
        &mut self,
        key: BucketKey,
        predicate: impl Fn(&ItemPrice) -> bool,
    ) -> Option<ItemPrice> {
        let bucket = self.buckets.get_mut(&key)?;
        let pos = bucket.iter().position(predicate)?;
        Some(bucket.swap_remove(pos))
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
