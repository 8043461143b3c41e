//! Favorites collection.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// A bookmarked product. Same shape as a catalog record, no quantity.
pub type FavoriteEntry = Product;

/// Result of adding a product to the favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    Added,
    /// The product was already a favorite; nothing changed.
    AlreadyExists,
}

/// The favorites collection. At most one entry per product ID.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    entries: Vec<FavoriteEntry>,
}

impl Favorites {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, product: Product) -> FavoriteOutcome {
        if self.contains(product.id) {
            return FavoriteOutcome::AlreadyExists;
        }
        self.entries.push(product);
        FavoriteOutcome::Added
    }

    /// Remove the entry for `id`. Returns whether an entry was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}
