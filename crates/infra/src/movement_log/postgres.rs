//! Postgres-backed movement log.
//!
//! Rows live in `inventory_movements`. The item is split into `item_kind`
//! (`product` / `packaging`) and `item_id`; `seq` (bigserial) gives a stable
//! newest-first order when several movements share a timestamp.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_core::{
    ActorId, LocationId, MovementId, PackagingItemId, ProductId, StockError, StockResult,
};
use stockroom_inventory::{MovementFilter, MovementRecord, StockItem};

use super::r#trait::MovementLog;
use crate::error::sqlx_to_stock;

#[derive(Debug, Clone)]
pub struct PostgresMovementLog {
    pool: Arc<PgPool>,
}

impl PostgresMovementLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn split_item(item: &StockItem) -> (&'static str, uuid::Uuid) {
    match item {
        StockItem::Product(id) => ("product", *id.as_uuid()),
        StockItem::Packaging(id) => ("packaging", *id.as_uuid()),
    }
}

#[async_trait]
impl MovementLog for PostgresMovementLog {
    #[instrument(skip(self, movements), fields(count = movements.len()), err)]
    async fn append(&self, movements: Vec<MovementRecord>) -> StockResult<()> {
        if movements.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(sqlx_to_stock("begin_transaction"))?;

        for m in &movements {
            let (item_kind, item_id) = split_item(&m.item);
            sqlx::query(
                r#"
                INSERT INTO inventory_movements (
                    id, item_kind, item_id, location_id, destination_location_id,
                    quantity, direction, movement_type, reference_id, notes,
                    actor_id, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(m.id.as_uuid())
            .bind(item_kind)
            .bind(item_id)
            .bind(m.location_id.map(|l| *l.as_uuid()))
            .bind(m.destination_location_id.map(|l| *l.as_uuid()))
            .bind(m.quantity)
            .bind(m.direction.as_str())
            .bind(m.movement_type.as_str())
            .bind(m.reference_id.as_deref())
            .bind(m.notes.as_deref())
            .bind(m.actor_id.map(|a| *a.as_uuid()))
            .bind(m.created_at)
            .execute(&mut *tx)
            .await
            .map_err(sqlx_to_stock("insert_movement"))?;
        }

        tx.commit().await.map_err(sqlx_to_stock("commit_transaction"))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: &MovementFilter) -> StockResult<Vec<MovementRecord>> {
        let (item_kind, item_id) = match &filter.item {
            Some(item) => {
                let (kind, id) = split_item(item);
                (Some(kind), Some(id))
            }
            None => (None, None),
        };
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, item_kind, item_id, location_id, destination_location_id,
                   quantity, direction, movement_type, reference_id, notes,
                   actor_id, created_at
            FROM inventory_movements
            WHERE ($1::text IS NULL OR item_kind = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
              AND ($3::uuid IS NULL OR location_id = $3 OR destination_location_id = $3)
              AND ($4::text IS NULL OR reference_id = $4)
              AND ($5::text IS NULL OR movement_type = $5)
            ORDER BY created_at DESC, seq DESC
            LIMIT $6
            "#,
        )
        .bind(item_kind)
        .bind(item_id)
        .bind(filter.location_id.map(|l| *l.as_uuid()))
        .bind(filter.reference_id.as_deref())
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(sqlx_to_stock("list_movements"))?;

        rows.iter()
            .map(|row| {
                MovementRow::try_from_row(row)
                    .map_err(sqlx_to_stock("decode_movement"))?
                    .into_record()
            })
            .collect()
    }
}

// SQLx row type

#[derive(Debug)]
struct MovementRow {
    id: uuid::Uuid,
    item_kind: String,
    item_id: uuid::Uuid,
    location_id: Option<uuid::Uuid>,
    destination_location_id: Option<uuid::Uuid>,
    quantity: i64,
    direction: String,
    movement_type: String,
    reference_id: Option<String>,
    notes: Option<String>,
    actor_id: Option<uuid::Uuid>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn try_from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            item_kind: row.try_get("item_kind")?,
            item_id: row.try_get("item_id")?,
            location_id: row.try_get("location_id")?,
            destination_location_id: row.try_get("destination_location_id")?,
            quantity: row.try_get("quantity")?,
            direction: row.try_get("direction")?,
            movement_type: row.try_get("movement_type")?,
            reference_id: row.try_get("reference_id")?,
            notes: row.try_get("notes")?,
            actor_id: row.try_get("actor_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> StockResult<MovementRecord> {
        let item = match self.item_kind.as_str() {
            "product" => StockItem::Product(ProductId::from_uuid(self.item_id)),
            "packaging" => StockItem::Packaging(PackagingItemId::from_uuid(self.item_id)),
            other => {
                return Err(StockError::storage(format!(
                    "unknown movement item kind '{other}'"
                )));
            }
        };

        Ok(MovementRecord {
            id: MovementId::from_uuid(self.id),
            item,
            location_id: self.location_id.map(LocationId::from_uuid),
            destination_location_id: self.destination_location_id.map(LocationId::from_uuid),
            quantity: self.quantity,
            direction: self.direction.parse()?,
            movement_type: self.movement_type.parse()?,
            reference_id: self.reference_id,
            notes: self.notes,
            actor_id: self.actor_id.map(ActorId::from_uuid),
            created_at: self.created_at,
        })
    }
}
