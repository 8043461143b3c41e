//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing or changing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one.
    #[error("quantity must be at least 1")]
    Zero,
    /// The requested value does not fit.
    #[error("quantity must be at most {max} (got {got})")]
    TooLarge {
        /// Largest accepted quantity.
        max: u32,
        /// Requested quantity.
        got: i64,
    },
}

/// Number of units of a product in the cart. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity; `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Interpret a requested quantity coming from a consumer.
    ///
    /// Returns `Ok(None)` for zero or negative requests, which callers treat
    /// as a removal.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the value exceeds `u32::MAX`.
    pub fn from_requested(value: i64) -> Result<Option<Self>, QuantityError> {
        if value <= 0 {
            return Ok(None);
        }
        u32::try_from(value)
            .map(Self::new)
            .map_err(|_| QuantityError::TooLarge {
                max: u32::MAX,
                got: value,
            })
    }

    /// Get the quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the quantity is already `u32::MAX`.
    pub fn incremented(self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(QuantityError::TooLarge {
                max: u32::MAX,
                got: i64::from(u32::MAX) + 1,
            })
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(QuantityError::Zero)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_requests_mean_removal() {
        assert_eq!(Quantity::from_requested(0).unwrap(), None);
        assert_eq!(Quantity::from_requested(-1).unwrap(), None);
        assert_eq!(Quantity::from_requested(3).unwrap(), Quantity::new(3));
    }

    #[test]
    fn test_oversized_request_rejected() {
        let err = Quantity::from_requested(i64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, QuantityError::TooLarge { .. }));
    }

    #[test]
    fn test_increment_overflow() {
        let max = Quantity::new(u32::MAX).unwrap();
        assert!(max.incremented().is_err());
        assert_eq!(Quantity::ONE.incremented().unwrap().get(), 2);
    }

    #[test]
    fn test_zero_does_not_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
