//! Command implementations.

pub mod cart;
pub mod favorites;
pub mod orders;

use clap::Args;
use thiserror::Error;

use watchshop_core::{Price, Product, ProductId};
use watchshop_store::backend::BackendError;
use watchshop_store::storage::StorageError;
use watchshop_store::{Applied, CartStore, CheckoutError, StoreError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// `--json` did not hold a product record.
    #[error("Invalid product JSON: {0}")]
    ProductJson(#[from] serde_json::Error),

    #[error("Missing --{0}")]
    MissingArg(&'static str),

    #[error("Order backend is not configured (set WATCHSHOP_BACKEND_URL and WATCHSHOP_BACKEND_ANON_KEY)")]
    NoBackend,

    #[error("Not signed in (set WATCHSHOP_USER_ID)")]
    NotSignedIn,

    /// Changes were applied but never reached disk.
    #[error("Changes could not be saved: {0}")]
    Unsaved(#[source] StorageError),
}

/// A product given on the command line.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Full product record as JSON
    #[arg(long, conflicts_with_all = ["id", "name", "price", "image"])]
    json: Option<String>,

    /// Product ID
    #[arg(long, required_unless_present = "json")]
    id: Option<ProductId>,

    /// Display name
    #[arg(long, required_unless_present = "json")]
    name: Option<String>,

    /// Unit price
    #[arg(long, required_unless_present = "json")]
    price: Option<Price>,

    /// Image URI
    #[arg(long, required_unless_present = "json")]
    image: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    mechanism: Option<String>,

    #[arg(long)]
    material: Option<String>,

    #[arg(long)]
    water_resistance: Option<String>,
}

impl ProductArgs {
    /// Build the product record.
    ///
    /// # Errors
    ///
    /// Returns `CliError::ProductJson` for an unreadable `--json` record and
    /// `CliError::MissingArg` when a required flag is absent.
    pub fn into_product(self) -> Result<Product, CliError> {
        if let Some(json) = self.json {
            return Ok(serde_json::from_str(&json)?);
        }

        let mut product = Product::new(
            self.id.ok_or(CliError::MissingArg("id"))?,
            self.name.ok_or(CliError::MissingArg("name"))?,
            self.price.ok_or(CliError::MissingArg("price"))?,
            self.image.ok_or(CliError::MissingArg("image"))?,
        );
        product.category = self.category;
        product.mechanism = self.mechanism;
        product.material = self.material;
        product.water_resistance = self.water_resistance;
        Ok(product)
    }
}

/// Warn when a change stayed in memory; `finish` makes a last attempt.
fn note_unsaved<T>(applied: &Applied<T>) {
    if let Some(error) = applied.persist_error() {
        tracing::warn!(error = %error, "Change not saved yet");
    }
}

/// Write anything still unsaved, then stop the store.
///
/// # Errors
///
/// Returns `CliError::Unsaved` if a collection still cannot be written.
pub async fn finish(store: &CartStore) -> Result<(), CliError> {
    let snapshot = store.snapshot();
    let flushed = if snapshot.cart_dirty || snapshot.favorites_dirty {
        Some(store.flush().await?)
    } else {
        None
    };
    store.shutdown().await?;

    match flushed {
        Some(Applied::Unpersisted { error, .. }) => Err(CliError::Unsaved(error)),
        _ => Ok(()),
    }
}
