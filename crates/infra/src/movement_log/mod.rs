//! Append-only movement log (audit trail).

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryMovementLog;
pub use postgres::PostgresMovementLog;
pub use r#trait::MovementLog;
