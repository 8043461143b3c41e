//! Checkout and order history against the order backend.

use watchshop_store::backend::{OrderBackend, RestOrderBackend};
use watchshop_store::{CartStore, StoreConfig, checkout as place_order};

use super::{CliError, note_unsaved};
use crate::output;

fn backend(config: &StoreConfig) -> Result<RestOrderBackend, CliError> {
    let backend = config.backend.as_ref().ok_or(CliError::NoBackend)?;
    Ok(RestOrderBackend::new(backend)?)
}

pub async fn checkout(store: &CartStore, config: &StoreConfig) -> Result<(), CliError> {
    let backend = backend(config)?;
    let receipt = place_order(store, &backend, config.customer).await?;
    note_unsaved(&receipt.cart_cleared);
    output::order_placed(&receipt.order, config.currency);
    Ok(())
}

pub async fn history(config: &StoreConfig) -> Result<(), CliError> {
    let customer = config.customer.ok_or(CliError::NotSignedIn)?;
    let orders = backend(config)?.orders_for(customer).await?;
    output::orders(&orders, config.currency);
    Ok(())
}
