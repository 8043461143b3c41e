//! Cart commands.

use watchshop_core::{CartAddOutcome, CurrencyCode, ProductId, QuantityOutcome};
use watchshop_store::CartStore;

use super::{CliError, ProductArgs, note_unsaved};
use crate::output;

pub fn list(store: &CartStore, currency: CurrencyCode) {
    output::cart(&store.cart(), currency);
}

pub fn summary(store: &CartStore, currency: CurrencyCode) {
    output::summary(&store.summary(), currency);
}

pub async fn add(store: &CartStore, product: ProductArgs) -> Result<(), CliError> {
    let product = product.into_product()?;
    let name = product.name.clone();

    let applied = store.add_to_cart(product).await?;
    note_unsaved(&applied);
    match applied.value() {
        CartAddOutcome::Inserted => output::message(&format!("Added {name} to the cart")),
        CartAddOutcome::Incremented { quantity } => {
            output::message(&format!("{name} is now in the cart x{quantity}"));
        }
    }
    Ok(())
}

pub async fn remove(store: &CartStore, id: ProductId) -> Result<(), CliError> {
    let applied = store.remove_from_cart(id).await?;
    note_unsaved(&applied);
    if *applied.value() {
        output::message(&format!("Removed product {id} from the cart"));
    } else {
        output::message(&format!("Product {id} was not in the cart"));
    }
    Ok(())
}

pub async fn set_quantity(store: &CartStore, id: ProductId, quantity: i64) -> Result<(), CliError> {
    let applied = store.update_quantity(id, quantity).await?;
    note_unsaved(&applied);
    match applied.value() {
        QuantityOutcome::Updated { quantity } => {
            output::message(&format!("Product {id} quantity set to {quantity}"));
        }
        QuantityOutcome::Removed { was_present: true } => {
            output::message(&format!("Removed product {id} from the cart"));
        }
        QuantityOutcome::Removed { was_present: false } | QuantityOutcome::NotInCart => {
            output::message(&format!("Product {id} was not in the cart"));
        }
    }
    Ok(())
}

pub async fn clear(store: &CartStore) -> Result<(), CliError> {
    let applied = store.clear_cart().await?;
    note_unsaved(&applied);
    output::message("Cart cleared");
    Ok(())
}
