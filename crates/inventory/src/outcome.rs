//! Successful results returned by the dispatch surface.

use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, PackagingItemId, ProductId};

use crate::bundle::BundleAvailability;
use crate::record::InventoryRecord;

/// `checkAvailability` answer (also returned by `checkBundleAvailability`
/// for products that are not bundles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub requested: i64,
    pub available: bool,
    pub current_quantity: i64,
    pub is_bundle: bool,
}

/// Snapshot of a record after a lifecycle mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevels {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub on_hand: i64,
    pub reserved: i64,
    pub available: i64,
}

impl From<&InventoryRecord> for StockLevels {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            product_id: record.key.product_id,
            location_id: record.key.location_id,
            on_hand: record.on_hand,
            reserved: record.reserved,
            available: record.available(),
        }
    }
}

/// Reserve / release / sale / return result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutcome {
    pub success: bool,
    pub quantity: i64,
    /// Quantity the release/sale could not take from `reserved`.
    pub clamped: i64,
    pub stock: StockLevels,
}

/// Adjustment-style result (product and packaging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentOutcome {
    pub success: bool,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub adjustment: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_item_id: Option<PackagingItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub success: bool,
    pub quantity: i64,
    pub source: StockLevels,
    pub destination: StockLevels,
}

/// Result of a bundle fan-out; one entry per component touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOutcome {
    pub success: bool,
    pub bundle_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub components: Vec<StockOutcome>,
}

/// Any successful dispatch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Availability(AvailabilityReport),
    BundleAvailability(BundleAvailability),
    Stock(StockOutcome),
    Adjustment(AdjustmentOutcome),
    Transfer(TransferOutcome),
    Bundle(BundleOutcome),
}
