use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{StockError, StockResult};
use stockroom_inventory::{
    Applied, InventoryRecord, PackagingKey, PackagingRecord, StockChange, StockKey,
};

/// An ordered set of changes that must commit together.
///
/// Changes are applied in order; a key may appear more than once and later
/// changes see the result of earlier ones. If any change is rejected, nothing
/// in the batch is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBatch {
    pub changes: Vec<(StockKey, StockChange)>,
    pub now: DateTime<Utc>,
}

impl LedgerBatch {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            changes: Vec::new(),
            now,
        }
    }

    pub fn single(key: StockKey, change: StockChange, now: DateTime<Utc>) -> Self {
        Self::new(now).with(key, change)
    }

    pub fn with(mut self, key: StockKey, change: StockChange) -> Self {
        self.changes.push((key, change));
        self
    }

    pub fn push(&mut self, key: StockKey, change: StockChange) {
        self.changes.push((key, change));
    }

    /// Distinct keys in ascending order (the lock acquisition order).
    pub fn lock_order(&self) -> Vec<StockKey> {
        let mut keys: Vec<StockKey> = self.changes.iter().map(|(k, _)| *k).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Persisted stock ledger.
///
/// Every write is a single atomic read-modify-write: implementations must
/// read, validate (via [`InventoryRecord::apply`]) and write each touched
/// record under one lock or transaction so two concurrent callers can never
/// both pass the same availability check.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Current record; zero-valued if the pair has never been touched.
    async fn get(&self, key: StockKey) -> StockResult<InventoryRecord>;

    /// Atomically apply a batch. Returns one [`Applied`] per change, in order.
    async fn commit(&self, batch: LedgerBatch) -> StockResult<Vec<Applied>>;

    async fn get_packaging(&self, key: PackagingKey) -> StockResult<PackagingRecord>;

    /// Atomically adjust packaging stock, returning (before, after).
    async fn adjust_packaging(
        &self,
        key: PackagingKey,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<(PackagingRecord, PackagingRecord)>;

    /// Convenience: raw delta mutation of one record.
    async fn mutate(
        &self,
        key: StockKey,
        on_hand_delta: i64,
        reserved_delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<InventoryRecord> {
        let change = StockChange::Delta {
            on_hand: on_hand_delta,
            reserved: reserved_delta,
        };
        self.commit(LedgerBatch::single(key, change, now))
            .await?
            .pop()
            .map(|applied| applied.after)
            .ok_or_else(|| StockError::storage("ledger returned no result for a single change"))
    }
}

#[async_trait]
impl<L> InventoryLedger for Arc<L>
where
    L: InventoryLedger + ?Sized,
{
    async fn get(&self, key: StockKey) -> StockResult<InventoryRecord> {
        (**self).get(key).await
    }

    async fn commit(&self, batch: LedgerBatch) -> StockResult<Vec<Applied>> {
        (**self).commit(batch).await
    }

    async fn get_packaging(&self, key: PackagingKey) -> StockResult<PackagingRecord> {
        (**self).get_packaging(key).await
    }

    async fn adjust_packaging(
        &self,
        key: PackagingKey,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<(PackagingRecord, PackagingRecord)> {
        (**self).adjust_packaging(key, delta, now).await
    }
}
