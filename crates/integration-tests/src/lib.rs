//! Integration tests for Watch Shop.
//!
//! These tests drive `watchshop-store` end to end against real files in a
//! temporary directory: open a store, mutate it, drop it, open it again.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p watchshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `store_persistence` - What survives a reopen, and what a damaged file loads as
//! - `store_scenarios` - Cart and favorites behaviour through the public API
//! - `checkout` - Order placement against an in-process backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use tempfile::TempDir;
use watchshop_core::{Price, Product, ProductId};
use watchshop_store::storage::{FileStorage, StorageKeys};
use watchshop_store::{CartStore, StoreOptions};

/// A data directory that lives as long as the context.
pub struct TestContext {
    dir: TempDir,
}

impl TestContext {
    /// # Panics
    ///
    /// If the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.dir.path())
    }

    /// Open a store over the shared, un-namespaced keys.
    pub async fn open(&self) -> CartStore {
        CartStore::open(self.storage(), StoreOptions::default()).await
    }

    /// Open a store whose keys are prefixed with `namespace`.
    ///
    /// # Panics
    ///
    /// If `namespace` is not a valid key prefix.
    pub async fn open_namespaced(&self, namespace: &str) -> CartStore {
        let options = StoreOptions {
            keys: StorageKeys::namespaced(Some(namespace)).expect("Invalid namespace"),
            ..StoreOptions::default()
        };
        CartStore::open(self.storage(), options).await
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn file_for(&self, key: &str) -> PathBuf {
        self.dir.path().join(format!("{}.json", key.replace(':', ".")))
    }

    /// Raw persisted value for `key`, if any.
    #[must_use]
    pub fn read_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_for(key)).ok()
    }

    /// # Panics
    ///
    /// If the file cannot be written.
    pub fn write_raw(&self, key: &str, value: &str) {
        std::fs::write(self.file_for(key), value).expect("Failed to write raw value");
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalogue watch priced in whole units.
#[must_use]
pub fn sample_watch(id: i32, price: u32) -> Product {
    Product::new(
        ProductId::new(id),
        format!("Watch {id}"),
        Price::from_minor_units(price * 100),
        format!("https://cdn.example/watches/{id}.jpg"),
    )
    .with_category("Diver")
    .with_mechanism("Automatic")
}
