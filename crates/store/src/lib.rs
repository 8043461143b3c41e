//! Watch Shop cart and favorites store.
//!
//! The store owns two persisted collections, the cart and the favorites, and
//! is the only writer of their persisted form. Consumers hold a cheap
//! [`CartStore`] handle; all mutations are funnelled through one writer task
//! so concurrent callers never interleave their read-modify-write cycles.
//!
//! # Example
//!
//! ```rust,ignore
//! use watchshop_store::{CartStore, StoreOptions, storage::FileStorage};
//!
//! let storage = FileStorage::new("/var/lib/watchshop");
//! let store = CartStore::open(storage, StoreOptions::default()).await;
//!
//! let applied = store.add_to_cart(product).await?;
//! if !applied.is_persisted() {
//!     tracing::warn!("cart change kept in memory only");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;

pub use checkout::{CheckoutError, CheckoutReceipt, checkout};
pub use config::{BackendConfig, ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use store::{Applied, CartStore, Collection, Snapshot, StoreEvent, StoreOptions};
