//! `stockroom-core`: shared identifiers and the stock failure taxonomy.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{StockError, StockResult, ensure_positive};
pub use id::{ActorId, LocationId, MovementId, PackagingItemId, ProductId};
