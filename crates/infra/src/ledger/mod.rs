//! Stock ledger boundary.
//!
//! Owns the on-hand / reserved quantities per (product, location) and the
//! packaging stock. Every write goes through an atomic batch so the ledger
//! invariant holds at each committed state.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use r#trait::{InventoryLedger, LedgerBatch};
