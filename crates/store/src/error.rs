//! Store error types.
//!
//! Storage failures are not errors at this level: a mutation that was applied
//! in memory but could not be written is reported through
//! [`Applied::Unpersisted`](crate::store::Applied). `StoreError` covers the
//! cases where the mutation did not take effect at all.

use thiserror::Error;
use watchshop_core::QuantityError;

/// Why a store operation did not take effect.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutation was refused; the collections are unchanged.
    #[error("Rejected: {0}")]
    Rejected(#[from] QuantityError),

    /// The writer task has stopped.
    #[error("Cart store is closed")]
    Closed,
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Closed;
        assert_eq!(err.to_string(), "Cart store is closed");

        let err = StoreError::from(QuantityError::Zero);
        assert_eq!(err.to_string(), "Rejected: quantity must be at least 1");
    }
}
