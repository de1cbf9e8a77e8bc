//! Inventory domain module.
//!
//! Business rules for stock records, reservations, bundles and packaging,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod bundle;
pub mod movement;
pub mod operation;
pub mod outcome;
pub mod packaging;
pub mod record;

pub use bundle::{BundleAvailability, BundleComponent, BundleDefinition, ComponentAvailability};
pub use movement::{Direction, MovementFilter, MovementRecord, MovementType, StockItem};
pub use operation::{
    AvailabilityQuery, Command, DispatchRequest, Operation, OrderLine, PackagingAdjustment,
    ReturnLine, StockAdjustment, StockTransfer,
};
pub use outcome::{
    AdjustmentOutcome, AvailabilityReport, BundleOutcome, Outcome, StockLevels, StockOutcome,
    TransferOutcome,
};
pub use packaging::{PackagingKey, PackagingRecord};
pub use record::{Applied, InventoryRecord, StockChange, StockKey};
