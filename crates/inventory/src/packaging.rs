//! Packaging / auxiliary stock.
//!
//! Packaging has no reservations: a single quantity per item, held either
//! centrally (`location_id == None`) or per outlet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, PackagingItemId, StockError, StockResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackagingKey {
    pub item_id: PackagingItemId,
    pub location_id: Option<LocationId>,
}

impl PackagingKey {
    pub fn central(item_id: PackagingItemId) -> Self {
        Self {
            item_id,
            location_id: None,
        }
    }

    pub fn at(item_id: PackagingItemId, location_id: LocationId) -> Self {
        Self {
            item_id,
            location_id: Some(location_id),
        }
    }
}

impl core::fmt::Display for PackagingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.location_id {
            Some(location) => write!(f, "packaging item {} at location {location}", self.item_id),
            None => write!(f, "packaging item {} (central)", self.item_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingRecord {
    pub key: PackagingKey,
    pub quantity: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PackagingRecord {
    pub fn empty(key: PackagingKey) -> Self {
        Self {
            key,
            quantity: 0,
            updated_at: None,
        }
    }

    /// Signed adjustment; rejected with `NegativeStock` if the result is below zero.
    pub fn adjust(&self, delta: i64, now: DateTime<Utc>) -> StockResult<PackagingRecord> {
        if delta == 0 {
            return Err(StockError::validation("adjustment cannot be zero"));
        }
        let quantity = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| StockError::validation("packaging quantity overflow"))?;
        if quantity < 0 {
            return Err(StockError::negative(self.key.to_string(), self.quantity, delta));
        }

        Ok(PackagingRecord {
            key: self.key,
            quantity,
            updated_at: Some(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_guards_against_negative_quantity() {
        let now = Utc::now();
        let record = PackagingRecord::empty(PackagingKey::central(PackagingItemId::new()));

        let stocked = record.adjust(20, now).unwrap();
        assert_eq!(stocked.quantity, 20);

        let err = stocked.adjust(-21, now).unwrap_err();
        assert_eq!(err.code(), "negative_stock");
        assert_eq!(stocked.adjust(-20, now).unwrap().quantity, 0);
    }

    #[test]
    fn outlet_and_central_keys_are_distinct() {
        let item = PackagingItemId::new();
        assert_ne!(PackagingKey::central(item), PackagingKey::at(item, LocationId::new()));
    }
}
