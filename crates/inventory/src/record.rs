use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ProductId, StockError, StockResult, ensure_positive};

/// Ledger key: one record per (product, location).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub location_id: LocationId,
}

impl StockKey {
    pub fn new(product_id: ProductId, location_id: LocationId) -> Self {
        Self {
            product_id,
            location_id,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "product {} at location {}", self.product_id, self.location_id)
    }
}

/// Stock held for one product at one location.
///
/// `available` is never stored; it is always `on_hand - reserved`.
/// Committed records satisfy `0 <= reserved <= on_hand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub key: StockKey,
    pub on_hand: i64,
    pub reserved: i64,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    /// Zero-valued record for a pair that has never been touched.
    pub fn empty(key: StockKey) -> Self {
        Self {
            key,
            on_hand: 0,
            reserved: 0,
            last_restocked_at: None,
            updated_at: None,
        }
    }

    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    pub fn is_consistent(&self) -> bool {
        self.reserved >= 0 && self.reserved <= self.on_hand
    }

    /// Raw delta mutation guarded by the ledger invariant.
    ///
    /// Rejects (without touching `self`) any post-state where on-hand or
    /// reserved would be negative, or reserved would exceed on-hand.
    pub fn mutate(&self, on_hand_delta: i64, reserved_delta: i64) -> StockResult<InventoryRecord> {
        let item = self.key.to_string();
        let on_hand = self
            .on_hand
            .checked_add(on_hand_delta)
            .ok_or_else(|| StockError::validation("on-hand quantity overflow"))?;
        let reserved = self
            .reserved
            .checked_add(reserved_delta)
            .ok_or_else(|| StockError::validation("reserved quantity overflow"))?;

        if on_hand < 0 {
            return Err(StockError::negative(item, self.on_hand, on_hand_delta));
        }
        if reserved < 0 {
            return Err(StockError::negative(item, self.reserved, reserved_delta));
        }
        if reserved > on_hand {
            return Err(StockError::insufficient(
                item,
                self.available(),
                reserved_delta - on_hand_delta,
            ));
        }

        Ok(InventoryRecord {
            on_hand,
            reserved,
            ..self.clone()
        })
    }

    /// Apply one lifecycle change, producing the new record.
    ///
    /// Pure: the caller decides whether and where to persist the result.
    pub fn apply(&self, change: StockChange, now: DateTime<Utc>) -> StockResult<Applied> {
        let item = self.key.to_string();
        let mut clamped = 0;

        let (on_hand_delta, reserved_delta) = match change {
            StockChange::Delta {
                on_hand,
                reserved,
            } => (on_hand, reserved),
            StockChange::Reserve(qty) => {
                ensure_positive("quantity", qty)?;
                if self.available() < qty {
                    return Err(StockError::insufficient(item, self.available(), qty));
                }
                (0, qty)
            }
            StockChange::Release(qty) => {
                ensure_positive("quantity", qty)?;
                let released = qty.min(self.reserved);
                clamped = qty - released;
                (0, -released)
            }
            StockChange::Sell(qty) => {
                ensure_positive("quantity", qty)?;
                if self.on_hand < qty {
                    return Err(StockError::insufficient(item, self.on_hand, qty));
                }
                let consumed = qty.min(self.reserved);
                clamped = qty - consumed;
                (-qty, -consumed)
            }
            StockChange::Return(qty) => {
                ensure_positive("quantity", qty)?;
                (qty, 0)
            }
            StockChange::Adjust(delta) => {
                if delta == 0 {
                    return Err(StockError::validation("adjustment cannot be zero"));
                }
                let new_on_hand = self
                    .on_hand
                    .checked_add(delta)
                    .ok_or_else(|| StockError::validation("on-hand quantity overflow"))?;
                if new_on_hand < 0 {
                    return Err(StockError::negative(item, self.on_hand, delta));
                }
                if new_on_hand < self.reserved {
                    return Err(StockError::insufficient(item, self.available(), -delta));
                }
                (delta, 0)
            }
            StockChange::TransferOut(qty) => {
                ensure_positive("quantity", qty)?;
                if self.on_hand < qty {
                    return Err(StockError::negative(item, self.on_hand, -qty));
                }
                if self.available() < qty {
                    return Err(StockError::insufficient(item, self.available(), qty));
                }
                (-qty, 0)
            }
            StockChange::TransferIn(qty) => {
                ensure_positive("quantity", qty)?;
                (qty, 0)
            }
        };

        let mut after = self.mutate(on_hand_delta, reserved_delta)?;
        after.updated_at = Some(now);
        if matches!(change, StockChange::Adjust(_)) {
            after.last_restocked_at = Some(now);
        }

        Ok(Applied {
            before: self.clone(),
            after,
            clamped,
        })
    }
}

/// A single quantity-affecting step against one record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockChange {
    /// Raw deltas, guarded only by the ledger invariant.
    Delta { on_hand: i64, reserved: i64 },
    /// Move free quantity into reserved; requires `available >= qty`.
    Reserve(i64),
    /// Return reserved quantity to free, floored at zero reserved.
    Release(i64),
    /// Remove physical quantity, consuming reservation first.
    Sell(i64),
    /// Put physical quantity back (customer return).
    Return(i64),
    /// Signed manual correction of on-hand.
    Adjust(i64),
    /// Source leg of a transfer; only free quantity may leave.
    TransferOut(i64),
    /// Destination leg of a transfer.
    TransferIn(i64),
}

/// Outcome of applying a [`StockChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub before: InventoryRecord,
    pub after: InventoryRecord,
    /// Quantity that could not be taken from `reserved` (release/sale beyond
    /// what was reserved). Zero in the normal case.
    pub clamped: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> StockKey {
        StockKey::new(ProductId::new(), LocationId::new())
    }

    fn record(on_hand: i64, reserved: i64) -> InventoryRecord {
        InventoryRecord {
            on_hand,
            reserved,
            ..InventoryRecord::empty(key())
        }
    }

    #[test]
    fn reserve_then_sell_keeps_available() {
        let now = Utc::now();
        let start = record(100, 0);

        let reserved = start.apply(StockChange::Reserve(30), now).unwrap().after;
        assert_eq!(reserved.available(), 70);

        let sold = reserved.apply(StockChange::Sell(30), now).unwrap().after;
        assert_eq!((sold.on_hand, sold.reserved, sold.available()), (70, 0, 70));
    }

    #[test]
    fn reserve_beyond_available_is_rejected() {
        let err = record(10, 8).apply(StockChange::Reserve(3), Utc::now()).unwrap_err();
        match err {
            StockError::InsufficientStock {
                available,
                requested,
                ..
            } => assert_eq!((available, requested), (2, 3)),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn over_release_clamps_to_zero() {
        let applied = record(10, 4).apply(StockChange::Release(7), Utc::now()).unwrap();
        assert_eq!(applied.after.reserved, 0);
        assert_eq!(applied.clamped, 3);
    }

    #[test]
    fn sale_beyond_reservation_reduces_available() {
        let applied = record(10, 2).apply(StockChange::Sell(5), Utc::now()).unwrap();
        assert_eq!((applied.after.on_hand, applied.after.reserved), (5, 0));
        assert_eq!(applied.clamped, 3);
        assert_eq!(applied.after.available(), 5);
    }

    #[test]
    fn sale_beyond_on_hand_is_rejected() {
        assert!(matches!(
            record(3, 3).apply(StockChange::Sell(4), Utc::now()),
            Err(StockError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn negative_adjustment_guard() {
        let err = record(3, 0).apply(StockChange::Adjust(-5), Utc::now()).unwrap_err();
        assert_eq!(err.code(), "negative_stock");
    }

    #[test]
    fn adjustment_cannot_strand_reservations() {
        assert!(matches!(
            record(5, 4).apply(StockChange::Adjust(-3), Utc::now()),
            Err(StockError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn adjustment_stamps_restock_time() {
        let now = Utc::now();
        let applied = record(0, 0).apply(StockChange::Adjust(12), now).unwrap();
        assert_eq!(applied.after.on_hand, 12);
        assert_eq!(applied.after.last_restocked_at, Some(now));
    }

    #[test]
    fn transfer_out_only_moves_free_stock() {
        let now = Utc::now();
        assert!(matches!(
            record(10, 8).apply(StockChange::TransferOut(3), now),
            Err(StockError::InsufficientStock { .. })
        ));
        assert!(matches!(
            record(2, 0).apply(StockChange::TransferOut(3), now),
            Err(StockError::NegativeStock { .. })
        ));
    }

    #[test]
    fn raw_mutation_rejects_reserved_above_on_hand() {
        assert!(record(5, 0).mutate(0, 6).is_err());
        assert!(record(5, 0).mutate(-6, 0).is_err());
        assert!(record(5, 2).mutate(0, -3).is_err());
        assert_eq!(record(5, 2).mutate(1, 1).unwrap().available(), 3);
    }

    #[test]
    fn zero_quantities_are_validation_errors() {
        let r = record(5, 0);
        let now = Utc::now();
        assert!(matches!(r.apply(StockChange::Reserve(0), now), Err(StockError::Validation(_))));
        assert!(matches!(r.apply(StockChange::Adjust(0), now), Err(StockError::Validation(_))));
    }

    fn change_strategy() -> impl Strategy<Value = StockChange> {
        prop_oneof![
            (1i64..50).prop_map(StockChange::Reserve),
            (1i64..50).prop_map(StockChange::Release),
            (1i64..50).prop_map(StockChange::Sell),
            (1i64..50).prop_map(StockChange::Return),
            (-50i64..50).prop_map(StockChange::Adjust),
            (1i64..50).prop_map(StockChange::TransferOut),
            (1i64..50).prop_map(StockChange::TransferIn),
            ((-50i64..50), (-50i64..50))
                .prop_map(|(on_hand, reserved)| StockChange::Delta { on_hand, reserved }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of changes is attempted, every
        /// committed state keeps `0 <= reserved <= on_hand`, and rejected
        /// changes leave the record as it was.
        #[test]
        fn invariant_holds_for_any_change_sequence(
            changes in prop::collection::vec(change_strategy(), 1..40)
        ) {
            let now = Utc::now();
            let mut current = InventoryRecord::empty(key());

            for change in changes {
                match current.apply(change, now) {
                    Ok(applied) => {
                        prop_assert_eq!(&applied.before, &current);
                        prop_assert!(applied.after.is_consistent());
                        prop_assert!(applied.after.available() >= 0);
                        current = applied.after;
                    }
                    Err(_) => prop_assert!(current.is_consistent()),
                }
            }
        }
    }
}
