//! Watch Shop Core - Shared domain types.
//!
//! This crate provides the types shared by every Watch Shop component:
//! - `store` - Persisted cart and favorites store
//! - `cli` - Command-line consumer of the store
//!
//! # Architecture
//!
//! The core crate contains only types and pure collection logic - no I/O, no
//! storage access, no HTTP clients. The merge and dedup rules for the cart
//! and favorites live here so they can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, quantities, product records, cart and favorites
//!   collections, and order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
