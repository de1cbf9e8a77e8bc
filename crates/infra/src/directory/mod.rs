//! Read-only configuration the engine consults: bundle composition and
//! actor-to-location assignments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryAssignments, InMemoryBundleCatalog};
pub use postgres::PostgresDirectory;
pub use r#trait::{AssignmentDirectory, BundleCatalog};
