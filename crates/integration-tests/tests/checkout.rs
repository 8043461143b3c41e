//! Order placement against an in-process order backend.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;
use watchshop_core::{CustomerId, NewOrder, OrderId, OrderRecord, OrderStatus, Price};
use watchshop_integration_tests::{TestContext, sample_watch};
use watchshop_store::backend::{BackendError, OrderBackend};
use watchshop_store::{CheckoutError, checkout};

/// Keeps orders in memory, newest last.
#[derive(Default)]
struct InMemoryBackend {
    orders: Mutex<Vec<OrderRecord>>,
    unavailable: bool,
}

impl OrderBackend for InMemoryBackend {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderRecord, BackendError> {
        if self.unavailable {
            return Err(BackendError::RateLimited(30));
        }
        let mut orders = self.orders.lock().unwrap();
        let record = OrderRecord {
            id: OrderId::new(i32::try_from(orders.len()).unwrap() + 1),
            user_id: order.user_id,
            total: order.total,
            status: order.status.clone(),
            created_at: Utc::now(),
        };
        orders.push(record.clone());
        Ok(record)
    }

    async fn orders_for(&self, customer: CustomerId) -> Result<Vec<OrderRecord>, BackendError> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .rev()
            .filter(|order| order.user_id == customer)
            .cloned()
            .collect())
    }
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_saved_cart() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let backend = InMemoryBackend::default();
    let customer = CustomerId::new(Uuid::new_v4());

    store.add_to_cart(sample_watch(1, 1200)).await.unwrap();
    store.add_to_cart(sample_watch(1, 1200)).await.unwrap();
    store.add_to_cart(sample_watch(2, 350)).await.unwrap();
    store.update_quantity(watchshop_core::ProductId::new(2), 3).await.unwrap();

    let receipt = checkout(&store, &backend, Some(customer)).await.unwrap();

    assert_eq!(receipt.order.total, Price::from_minor_units(345_000));
    assert_eq!(receipt.order.status, OrderStatus::Pending);
    assert!(receipt.cart_cleared.is_persisted());
    assert!(!ctx.file_for("cart").exists());

    store.shutdown().await.unwrap();
    assert!(ctx.open().await.cart().is_empty());
}

#[tokio::test]
async fn test_order_history_is_newest_first() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let backend = InMemoryBackend::default();
    let customer = CustomerId::new(Uuid::new_v4());

    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    let first = checkout(&store, &backend, Some(customer)).await.unwrap();
    store.add_to_cart(sample_watch(2, 200)).await.unwrap();
    let second = checkout(&store, &backend, Some(customer)).await.unwrap();

    let history = backend.orders_for(customer).await.unwrap();
    let ids: Vec<OrderId> = history.iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![second.order.id, first.order.id]);

    let stranger = CustomerId::new(Uuid::new_v4());
    assert!(backend.orders_for(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_backend_keeps_saved_cart() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let backend = InMemoryBackend {
        unavailable: true,
        ..InMemoryBackend::default()
    };

    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    let err = checkout(&store, &backend, Some(CustomerId::new(Uuid::new_v4())))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Backend(BackendError::RateLimited(30))
    ));
    store.shutdown().await.unwrap();
    assert_eq!(ctx.open().await.cart().len(), 1);
}

#[tokio::test]
async fn test_signed_out_checkout_is_refused() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let backend = InMemoryBackend::default();
    store.add_to_cart(sample_watch(1, 100)).await.unwrap();

    let err = checkout(&store, &backend, None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NotSignedIn));
    assert!(backend.orders.lock().unwrap().is_empty());
}
