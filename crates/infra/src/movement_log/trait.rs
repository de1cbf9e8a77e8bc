use std::sync::Arc;

use async_trait::async_trait;

use stockroom_core::StockResult;
use stockroom_inventory::{MovementFilter, MovementRecord};

/// Append-only audit trail of quantity and reservation changes.
///
/// Movements are never updated or deleted.
#[async_trait]
pub trait MovementLog: Send + Sync {
    /// Append movements in order. An empty batch is a no-op.
    async fn append(&self, movements: Vec<MovementRecord>) -> StockResult<()>;

    /// Movements matching `filter`, newest first, truncated to `filter.limit`.
    async fn list(&self, filter: &MovementFilter) -> StockResult<Vec<MovementRecord>>;
}

#[async_trait]
impl<M> MovementLog for Arc<M>
where
    M: MovementLog + ?Sized,
{
    async fn append(&self, movements: Vec<MovementRecord>) -> StockResult<()> {
        (**self).append(movements).await
    }

    async fn list(&self, filter: &MovementFilter) -> StockResult<Vec<MovementRecord>> {
        (**self).list(filter).await
    }
}
