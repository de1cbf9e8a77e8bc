//! Infrastructure layer: storage backends and the inventory engine.

pub mod directory;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod movement_log;

pub use engine::InventoryEngine;
pub use error::StoreError;
