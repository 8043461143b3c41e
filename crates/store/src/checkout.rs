//! Checkout: turn the cart into a backend order, then clear the cart.
//!
//! Order creation belongs to the backend. The store's part is computing the
//! total from its current cart and taking the ordered lines out once the
//! backend has accepted the order. If the backend call fails the cart is left
//! as it was.

use thiserror::Error;
use tracing::{info, instrument, warn};

use watchshop_core::{CustomerId, NewOrder, OrderRecord, OrderStatus};

use crate::backend::{BackendError, OrderBackend};
use crate::error::StoreError;
use crate::store::{Applied, CartStore};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders are tied to an account.
    #[error("Sign in to place an order")]
    NotSignedIn,

    #[error("Cart is empty")]
    EmptyCart,

    /// The backend did not create the order; the cart is unchanged.
    #[error("Order backend error: {0}")]
    Backend(#[from] BackendError),

    /// The order was created but the store could not be reached to clear the cart.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A placed order.
#[derive(Debug)]
pub struct CheckoutReceipt {
    pub order: OrderRecord,
    /// Whether the cart without the ordered lines reached storage.
    pub cart_cleared: Applied<()>,
}

/// Place an order for the current cart on behalf of `customer`.
///
/// The order covers the cart as it is at the moment of the call. Units added
/// while the backend request is in flight stay in the cart afterwards.
///
/// # Errors
///
/// - `CheckoutError::NotSignedIn` when `customer` is `None`
/// - `CheckoutError::EmptyCart` when there is nothing to order
/// - `CheckoutError::Backend` when the order could not be created
/// - `CheckoutError::Store` when the cart could not be updated afterwards
#[instrument(skip(store, backend))]
pub async fn checkout<B: OrderBackend>(
    store: &CartStore,
    backend: &B,
    customer: Option<CustomerId>,
) -> Result<CheckoutReceipt, CheckoutError> {
    let user_id = customer.ok_or(CheckoutError::NotSignedIn)?;

    let ordered = store.cart();
    let summary = ordered.summary();
    if summary.line_count == 0 {
        return Err(CheckoutError::EmptyCart);
    }

    let order = NewOrder {
        user_id,
        total: summary.subtotal,
        status: OrderStatus::Pending,
    };
    let order = backend.create_order(&order).await?;
    info!(order_id = %order.id, total = %order.total, items = summary.item_count, "Order placed");

    let cart_cleared = store.remove_ordered(ordered).await?;
    if let Some(error) = cart_cleared.persist_error() {
        warn!(order_id = %order.id, error = %error, "Order placed but updated cart was not saved");
    }

    Ok(CheckoutReceipt {
        order,
        cart_cleared,
    })
}
