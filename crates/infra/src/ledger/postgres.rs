//! Postgres-backed ledger.
//!
//! Every batch runs in one transaction:
//!
//! 1. Ensure a row exists for each touched key (`INSERT … ON CONFLICT DO NOTHING`)
//! 2. Lock each row with `SELECT … FOR UPDATE`, in ascending key order
//! 3. Apply the domain change to the locked values
//! 4. Write back each touched row once
//! 5. Commit, or roll back on the first rejected change
//!
//! Locking in a fixed key order means two batches touching overlapping keys
//! serialize instead of deadlocking. Batches on disjoint keys run in parallel.
//! The table's check constraints mirror the invariant as a last line of defence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_core::{LocationId, PackagingItemId, ProductId, StockResult};
use stockroom_inventory::{Applied, InventoryRecord, PackagingKey, PackagingRecord, StockKey};

use super::r#trait::{InventoryLedger, LedgerBatch};
use crate::error::sqlx_to_stock;

#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: Arc<PgPool>,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InventoryLedger for PostgresLedger {
    #[instrument(skip(self), fields(product_id = %key.product_id, location_id = %key.location_id), err)]
    async fn get(&self, key: StockKey) -> StockResult<InventoryRecord> {
        let row = sqlx::query(
            r#"
            SELECT product_id, location_id, on_hand, reserved, last_restocked_at, updated_at
            FROM inventory_records
            WHERE product_id = $1 AND location_id = $2
            "#,
        )
        .bind(key.product_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(sqlx_to_stock("get_record"))?;

        match row {
            Some(row) => Ok(InventoryRow::try_from_row(&row)
                .map_err(sqlx_to_stock("decode_record"))?
                .into()),
            None => Ok(InventoryRecord::empty(key)),
        }
    }

    #[instrument(skip(self, batch), fields(changes = batch.changes.len()), err)]
    async fn commit(&self, batch: LedgerBatch) -> StockResult<Vec<Applied>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sqlx_to_stock("begin_transaction"))?;

        let mut staged: HashMap<StockKey, InventoryRecord> = HashMap::new();
        for key in batch.lock_order() {
            let record = lock_record(&mut tx, key).await?;
            staged.insert(key, record);
        }

        let mut results = Vec::with_capacity(batch.changes.len());
        for (key, change) in batch.changes {
            let current = staged
                .get(&key)
                .cloned()
                .unwrap_or_else(|| InventoryRecord::empty(key));
            match current.apply(change, batch.now) {
                Ok(applied) => {
                    staged.insert(key, applied.after.clone());
                    results.push(applied);
                }
                Err(e) => {
                    tx.rollback().await.map_err(sqlx_to_stock("rollback"))?;
                    return Err(e);
                }
            }
        }

        for record in staged.values() {
            sqlx::query(
                r#"
                UPDATE inventory_records
                SET on_hand = $3,
                    reserved = $4,
                    last_restocked_at = $5,
                    updated_at = COALESCE($6, NOW())
                WHERE product_id = $1 AND location_id = $2
                "#,
            )
            .bind(record.key.product_id.as_uuid())
            .bind(record.key.location_id.as_uuid())
            .bind(record.on_hand)
            .bind(record.reserved)
            .bind(record.last_restocked_at)
            .bind(record.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(sqlx_to_stock("update_record"))?;
        }

        tx.commit().await.map_err(sqlx_to_stock("commit_transaction"))?;
        Ok(results)
    }

    async fn get_packaging(&self, key: PackagingKey) -> StockResult<PackagingRecord> {
        let row = match key.location_id {
            Some(location) => sqlx::query(
                r#"
                SELECT item_id, location_id, quantity, updated_at
                FROM packaging_stock
                WHERE item_id = $1 AND location_id = $2
                "#,
            )
            .bind(key.item_id.as_uuid())
            .bind(location.as_uuid())
            .fetch_optional(&*self.pool)
            .await,
            None => sqlx::query(
                r#"
                SELECT item_id, location_id, quantity, updated_at
                FROM packaging_stock
                WHERE item_id = $1 AND location_id IS NULL
                "#,
            )
            .bind(key.item_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await,
        }
        .map_err(sqlx_to_stock("get_packaging"))?;

        match row {
            Some(row) => Ok(PackagingRow::try_from_row(&row)
                .map_err(sqlx_to_stock("decode_packaging"))?
                .into()),
            None => Ok(PackagingRecord::empty(key)),
        }
    }

    #[instrument(skip(self), fields(item_id = %key.item_id), err)]
    async fn adjust_packaging(
        &self,
        key: PackagingKey,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<(PackagingRecord, PackagingRecord)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sqlx_to_stock("begin_transaction"))?;

        // Central rows have a NULL location; the partial unique indexes in the
        // schema make both inserts idempotent.
        let location = key.location_id.map(|l| *l.as_uuid());
        sqlx::query(
            r#"
            INSERT INTO packaging_stock (item_id, location_id, quantity)
            VALUES ($1, $2, 0)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(location)
        .execute(&mut *tx)
        .await
        .map_err(sqlx_to_stock("ensure_packaging"))?;

        let row = sqlx::query(
            r#"
            SELECT item_id, location_id, quantity, updated_at
            FROM packaging_stock
            WHERE item_id = $1 AND location_id IS NOT DISTINCT FROM $2
            FOR UPDATE
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(location)
        .fetch_one(&mut *tx)
        .await
        .map_err(sqlx_to_stock("lock_packaging"))?;

        let before: PackagingRecord = PackagingRow::try_from_row(&row)
            .map_err(sqlx_to_stock("decode_packaging"))?
            .into();
        let after = match before.adjust(delta, now) {
            Ok(after) => after,
            Err(e) => {
                tx.rollback().await.map_err(sqlx_to_stock("rollback"))?;
                return Err(e);
            }
        };

        sqlx::query(
            r#"
            UPDATE packaging_stock
            SET quantity = $3, updated_at = $4
            WHERE item_id = $1 AND location_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(location)
        .bind(after.quantity)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(sqlx_to_stock("update_packaging"))?;

        tx.commit().await.map_err(sqlx_to_stock("commit_transaction"))?;
        Ok((before, after))
    }
}

async fn lock_record(
    tx: &mut Transaction<'_, Postgres>,
    key: StockKey,
) -> StockResult<InventoryRecord> {
    sqlx::query(
        r#"
        INSERT INTO inventory_records (product_id, location_id, on_hand, reserved)
        VALUES ($1, $2, 0, 0)
        ON CONFLICT (product_id, location_id) DO NOTHING
        "#,
    )
    .bind(key.product_id.as_uuid())
    .bind(key.location_id.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(sqlx_to_stock("ensure_record"))?;

    let row = sqlx::query(
        r#"
        SELECT product_id, location_id, on_hand, reserved, last_restocked_at, updated_at
        FROM inventory_records
        WHERE product_id = $1 AND location_id = $2
        FOR UPDATE
        "#,
    )
    .bind(key.product_id.as_uuid())
    .bind(key.location_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(sqlx_to_stock("lock_record"))?;

    Ok(InventoryRow::try_from_row(&row)
        .map_err(sqlx_to_stock("decode_record"))?
        .into())
}

// SQLx row types

#[derive(Debug)]
struct InventoryRow {
    product_id: uuid::Uuid,
    location_id: uuid::Uuid,
    on_hand: i64,
    reserved: i64,
    last_restocked_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl InventoryRow {
    fn try_from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            product_id: row.try_get("product_id")?,
            location_id: row.try_get("location_id")?,
            on_hand: row.try_get("on_hand")?,
            reserved: row.try_get("reserved")?,
            last_restocked_at: row.try_get("last_restocked_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            key: StockKey::new(
                ProductId::from_uuid(row.product_id),
                LocationId::from_uuid(row.location_id),
            ),
            on_hand: row.on_hand,
            reserved: row.reserved,
            last_restocked_at: row.last_restocked_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct PackagingRow {
    item_id: uuid::Uuid,
    location_id: Option<uuid::Uuid>,
    quantity: i64,
    updated_at: Option<DateTime<Utc>>,
}

impl PackagingRow {
    fn try_from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PackagingRow {
            item_id: row.try_get("item_id")?,
            location_id: row.try_get("location_id")?,
            quantity: row.try_get("quantity")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<PackagingRow> for PackagingRecord {
    fn from(row: PackagingRow) -> Self {
        PackagingRecord {
            key: PackagingKey {
                item_id: PackagingItemId::from_uuid(row.item_id),
                location_id: row.location_id.map(LocationId::from_uuid),
            },
            quantity: row.quantity,
            updated_at: row.updated_at,
        }
    }
}
