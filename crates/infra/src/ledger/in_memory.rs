use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::StockResult;
use stockroom_inventory::{Applied, InventoryRecord, PackagingKey, PackagingRecord, StockKey};

use super::r#trait::{InventoryLedger, LedgerBatch};
use crate::error::StoreError;

/// In-memory ledger.
///
/// Intended for tests/dev. A batch is staged against a private overlay while
/// the write lock is held and only copied into the map once every change has
/// been accepted, so a rejected batch leaves no trace.
///
/// One write lock covers the whole map, so every commit is serialized, even
/// on unrelated keys. Only [`PostgresLedger`](super::PostgresLedger) lets
/// batches on disjoint keys proceed in parallel.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<HashMap<StockKey, InventoryRecord>>,
    packaging: RwLock<HashMap<PackagingKey, PackagingRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly (tests/fixtures). Bypasses the movement log.
    pub fn seed(&self, key: StockKey, on_hand: i64, reserved: i64) -> StockResult<InventoryRecord> {
        let record = InventoryRecord::empty(key).mutate(on_hand, reserved)?;
        let mut map = self
            .records
            .write()
            .map_err(|_| StoreError::Poisoned("inventory records"))?;
        map.insert(key, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl InventoryLedger for InMemoryLedger {
    async fn get(&self, key: StockKey) -> StockResult<InventoryRecord> {
        let map = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("inventory records"))?;
        Ok(map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| InventoryRecord::empty(key)))
    }

    async fn commit(&self, batch: LedgerBatch) -> StockResult<Vec<Applied>> {
        let mut map = self
            .records
            .write()
            .map_err(|_| StoreError::Poisoned("inventory records"))?;

        let mut staged: HashMap<StockKey, InventoryRecord> = HashMap::new();
        let mut results = Vec::with_capacity(batch.changes.len());

        for (key, change) in batch.changes {
            let current = staged
                .get(&key)
                .or_else(|| map.get(&key))
                .cloned()
                .unwrap_or_else(|| InventoryRecord::empty(key));
            let applied = current.apply(change, batch.now)?;
            staged.insert(key, applied.after.clone());
            results.push(applied);
        }

        map.extend(staged);
        Ok(results)
    }

    async fn get_packaging(&self, key: PackagingKey) -> StockResult<PackagingRecord> {
        let map = self
            .packaging
            .read()
            .map_err(|_| StoreError::Poisoned("packaging stock"))?;
        Ok(map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| PackagingRecord::empty(key)))
    }

    async fn adjust_packaging(
        &self,
        key: PackagingKey,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<(PackagingRecord, PackagingRecord)> {
        let mut map = self
            .packaging
            .write()
            .map_err(|_| StoreError::Poisoned("packaging stock"))?;
        let before = map
            .get(&key)
            .cloned()
            .unwrap_or_else(|| PackagingRecord::empty(key));
        let after = before.adjust(delta, now)?;
        map.insert(key, after.clone());
        Ok((before, after))
    }
}
