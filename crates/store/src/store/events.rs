//! Notifications for consumers to surface to the user.

use core::fmt;

use watchshop_core::{ProductId, Quantity};

/// Which collection an event or failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cart,
    Favorites,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Favorites => "favorites",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something happened that a consumer may want to tell the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    AddedToCart {
        id: ProductId,
        name: String,
        quantity: Quantity,
    },
    AddedToFavorites {
        id: ProductId,
        name: String,
    },
    AlreadyInFavorites {
        id: ProductId,
        name: String,
    },
    CartCleared,
    /// A change was kept in memory but could not be written.
    PersistFailed {
        collection: Collection,
        error: String,
    },
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddedToCart { name, quantity, .. } => {
                write!(f, "{name} added to cart (quantity {quantity})")
            }
            Self::AddedToFavorites { name, .. } => write!(f, "{name} added to favorites"),
            Self::AlreadyInFavorites { name, .. } => write!(f, "{name} is already a favorite"),
            Self::CartCleared => f.write_str("Cart cleared"),
            Self::PersistFailed { collection, error } => {
                write!(f, "Could not save {collection}: {error}")
            }
        }
    }
}
