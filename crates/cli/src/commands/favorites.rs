//! Favorites commands.

use watchshop_core::{CurrencyCode, FavoriteOutcome, ProductId};
use watchshop_store::CartStore;

use super::{CliError, ProductArgs, note_unsaved};
use crate::output;

pub fn list(store: &CartStore, currency: CurrencyCode) {
    output::favorites(&store.favorites(), currency);
}

pub async fn add(store: &CartStore, product: ProductArgs) -> Result<(), CliError> {
    let product = product.into_product()?;
    let name = product.name.clone();

    let applied = store.add_to_favorites(product).await?;
    note_unsaved(&applied);
    match applied.value() {
        FavoriteOutcome::Added => output::message(&format!("Added {name} to favorites")),
        FavoriteOutcome::AlreadyExists => {
            output::message(&format!("{name} is already in your favorites"));
        }
    }
    Ok(())
}

pub async fn remove(store: &CartStore, id: ProductId) -> Result<(), CliError> {
    let applied = store.remove_favorite(id).await?;
    note_unsaved(&applied);
    if *applied.value() {
        output::message(&format!("Removed product {id} from favorites"));
    } else {
        output::message(&format!("Product {id} was not in favorites"));
    }
    Ok(())
}
