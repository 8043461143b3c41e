//! Core types for Watch Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod favorites;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod quantity;

pub use cart::{Cart, CartAddOutcome, CartLine, CartSummary, QuantityOutcome};
pub use favorites::{FavoriteEntry, FavoriteOutcome, Favorites};
pub use id::*;
pub use order::{NewOrder, OrderRecord, OrderStatus};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::Product;
pub use quantity::{Quantity, QuantityError};
