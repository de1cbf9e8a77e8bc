//! Storage error model and SQLx error mapping.
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Conflict` |
//! | Database (check constraint violation) | `23514` | `Constraint` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use thiserror::Error;

use stockroom_core::StockError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Concurrent transaction conflict; the caller may retry.
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),

    /// A database check constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("backend failure: {0}")]
    Backend(String),

    /// In-process lock poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl From<StoreError> for StockError {
    fn from(value: StoreError) -> Self {
        StockError::storage(value.to_string())
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Shorthand for mapping straight into the domain error at call sites.
pub(crate) fn sqlx_to_stock(operation: &'static str) -> impl Fn(sqlx::Error) -> StockError {
    move |e| map_sqlx_error(operation, e).into()
}
