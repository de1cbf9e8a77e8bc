use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use stockroom_core::{StockError, StockResult};
use stockroom_inventory::{MovementFilter, MovementRecord};

use super::r#trait::MovementLog;
use crate::error::StoreError;

/// In-memory movement log.
///
/// Intended for tests/dev. `fail_appends` makes every append error so callers
/// can check that a committed quantity change survives an audit failure.
#[derive(Debug, Default)]
pub struct InMemoryMovementLog {
    movements: RwLock<Vec<MovementRecord>>,
    failing: AtomicBool,
}

impl InMemoryMovementLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every movement in append order.
    pub fn all(&self) -> StockResult<Vec<MovementRecord>> {
        let movements = self
            .movements
            .read()
            .map_err(|_| StoreError::Poisoned("movement log"))?;
        Ok(movements.clone())
    }
}

#[async_trait]
impl MovementLog for InMemoryMovementLog {
    async fn append(&self, movements: Vec<MovementRecord>) -> StockResult<()> {
        if movements.is_empty() {
            return Ok(());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StockError::storage("movement log rejected append"));
        }
        let mut log = self
            .movements
            .write()
            .map_err(|_| StoreError::Poisoned("movement log"))?;
        log.extend(movements);
        Ok(())
    }

    async fn list(&self, filter: &MovementFilter) -> StockResult<Vec<MovementRecord>> {
        let log = self
            .movements
            .read()
            .map_err(|_| StoreError::Poisoned("movement log"))?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(log
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::{LocationId, ProductId};
    use stockroom_inventory::{Direction, MovementType, StockItem};

    fn movement(product: ProductId, location: LocationId, kind: MovementType) -> MovementRecord {
        MovementRecord::new(
            StockItem::Product(product),
            Some(location),
            kind,
            1,
            Direction::None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn lists_newest_first_with_limit() {
        let log = InMemoryMovementLog::new();
        let product = ProductId::new();
        let location = LocationId::new();
        log.append(vec![
            movement(product, location, MovementType::Reservation),
            movement(product, location, MovementType::Sale),
            movement(ProductId::new(), location, MovementType::Return),
        ])
        .await
        .unwrap();

        let filter = MovementFilter {
            item: Some(StockItem::Product(product)),
            limit: Some(1),
            ..MovementFilter::default()
        };
        let found = log.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].movement_type, MovementType::Sale);
    }

    #[tokio::test]
    async fn failing_log_keeps_nothing() {
        let log = InMemoryMovementLog::new();
        log.fail_appends(true);
        let m = movement(ProductId::new(), LocationId::new(), MovementType::Sale);
        assert!(log.append(vec![m]).await.is_err());
        assert!(log.all().unwrap().is_empty());
    }
}
