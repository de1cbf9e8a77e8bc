//! Stock failure taxonomy.

use thiserror::Error;

/// Result type used across the engine.
pub type StockResult<T> = Result<T, StockError>;

/// Typed failure returned by every inventory operation.
///
/// Every variant except `Storage` is a deterministic business outcome; callers
/// decide retry policy. A failed mutation never leaves a partial write behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Requested reservation/sale/transfer exceeds what is available.
    #[error("insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// An adjustment would drive on-hand quantity below zero.
    #[error("negative stock for {item}: on hand {current}, adjustment {adjustment}")]
    NegativeStock {
        item: String,
        current: i64,
        adjustment: i64,
    },

    /// Actor is not scoped to the target location (or lacks a capability).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Missing bundle definition or required record.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unrecognized dispatch operation name.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed payload or out-of-range quantity.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store failed; the mutation was not applied.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StockError {
    pub fn insufficient(item: impl Into<String>, available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            item: item.into(),
            available,
            requested,
        }
    }

    pub fn negative(item: impl Into<String>, current: i64, adjustment: i64) -> Self {
        Self::NegativeStock {
            item: item.into(),
            current,
            adjustment,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_operation(name: impl Into<String>) -> Self {
        Self::InvalidOperation(name.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code (used in API error bodies and logs).
    pub fn code(&self) -> &'static str {
        match self {
            StockError::InsufficientStock { .. } => "insufficient_stock",
            StockError::NegativeStock { .. } => "negative_stock",
            StockError::Unauthorized(_) => "unauthorized",
            StockError::NotFound(_) => "not_found",
            StockError::InvalidOperation(_) => "invalid_operation",
            StockError::Validation(_) => "validation_error",
            StockError::Storage(_) => "storage_error",
        }
    }
}

/// Reject zero or negative quantities for operations that move a fixed amount.
pub fn ensure_positive(field: &str, qty: i64) -> StockResult<()> {
    if qty <= 0 {
        return Err(StockError::validation(format!(
            "{field} must be greater than zero (got {qty})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_carries_quantities() {
        let err = StockError::insufficient("widget@main", 3, 5);
        assert_eq!(
            err.to_string(),
            "insufficient stock for widget@main: available 3, requested 5"
        );
        assert_eq!(err.code(), "insufficient_stock");
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive("quantity", 1).is_ok());
        assert!(matches!(
            ensure_positive("quantity", 0),
            Err(StockError::Validation(_))
        ));
    }
}
