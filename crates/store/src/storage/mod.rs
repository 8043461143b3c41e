//! Persisted key-value storage.
//!
//! The store addresses storage through two fixed keys, one per collection.
//! Values are JSON arrays of the collection's records.
//!
//! # Backends
//!
//! - [`FileStorage`] - one JSON file per key in a data directory
//! - [`MemoryStorage`] - in-process map, used by tests and ephemeral sessions

mod fs;
mod memory;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

pub use fs::FileStorage;
pub use memory::MemoryStorage;

/// Key under which the cart is persisted.
pub const CART_KEY: &str = "cart";
/// Key under which the favorites are persisted.
pub const FAVORITES_KEY: &str = "favorites";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key contains characters the backend cannot address.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The collection could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string storage addressed by key.
///
/// `get` returns `Ok(None)` for a key that was never written or was removed.
/// `remove` of a missing key succeeds.
pub trait KeyValueStorage: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: KeyValueStorage> KeyValueStorage for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).remove(key)
    }
}

/// The pair of keys a store instance reads and writes.
///
/// Without a namespace the keys are `cart` and `favorites`, shared by
/// everyone using the same storage. A namespace (for example a customer ID)
/// prefixes both keys as `<namespace>:cart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub cart: String,
    pub favorites: String,
}

impl StorageKeys {
    /// Keys for `namespace`; `None` or a blank namespace gives the shared keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` unless the namespace is made of
    /// ASCII letters, digits, `_` and `-`.
    pub fn namespaced(namespace: Option<&str>) -> Result<Self, StorageError> {
        let Some(ns) = namespace.map(str::trim).filter(|ns| !ns.is_empty()) else {
            return Ok(Self::default());
        };
        if !ns.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-')) {
            return Err(StorageError::InvalidKey(ns.to_string()));
        }
        Ok(Self {
            cart: format!("{ns}:{CART_KEY}"),
            favorites: format!("{ns}:{FAVORITES_KEY}"),
        })
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            cart: CART_KEY.to_string(),
            favorites: FAVORITES_KEY.to_string(),
        }
    }
}

/// Check that a key only uses characters every backend can address.
///
/// `.` is excluded so that file backends can spell `:` as `.` without two
/// keys sharing a file.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
