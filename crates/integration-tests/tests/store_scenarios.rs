//! Cart and favorites behaviour through the public store API.

#![allow(clippy::unwrap_used)]

use watchshop_core::{CartAddOutcome, FavoriteOutcome, ProductId, QuantityOutcome};
use watchshop_integration_tests::{TestContext, sample_watch};
use watchshop_store::StoreEvent;

fn lines(store: &watchshop_store::CartStore) -> Vec<(i32, u32)> {
    store
        .cart()
        .lines()
        .iter()
        .map(|line| (line.id().as_i32(), line.quantity.get()))
        .collect()
}

#[tokio::test]
async fn test_add_update_remove_scenario() {
    let ctx = TestContext::new();
    let store = ctx.open().await;

    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    store.add_to_cart(sample_watch(2, 250)).await.unwrap();
    assert_eq!(lines(&store), vec![(1, 2), (2, 1)]);

    store.update_quantity(ProductId::new(1), 1).await.unwrap();
    assert_eq!(lines(&store), vec![(1, 1), (2, 1)]);

    store.remove_from_cart(ProductId::new(2)).await.unwrap();
    assert_eq!(lines(&store), vec![(1, 1)]);

    store.shutdown().await.unwrap();
    assert_eq!(lines(&ctx.open().await), vec![(1, 1)]);
}

#[tokio::test]
async fn test_repeated_adds_accumulate_on_one_line() {
    let ctx = TestContext::new();
    let store = ctx.open().await;

    for n in 1..=5 {
        let applied = store.add_to_cart(sample_watch(9, 400)).await.unwrap();
        let expected = if n == 1 {
            CartAddOutcome::Inserted
        } else {
            CartAddOutcome::Incremented {
                quantity: watchshop_core::Quantity::new(n).unwrap(),
            }
        };
        assert_eq!(*applied.value(), expected);
    }

    assert_eq!(lines(&store), vec![(9, 5)]);
    assert_eq!(store.summary().item_count, 5);
}

#[tokio::test]
async fn test_zero_and_negative_quantities_remove() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    store.add_to_cart(sample_watch(2, 100)).await.unwrap();

    let zero = store.update_quantity(ProductId::new(1), 0).await.unwrap();
    assert_eq!(
        *zero.value(),
        QuantityOutcome::Removed { was_present: true }
    );
    let negative = store.update_quantity(ProductId::new(2), -1).await.unwrap();
    assert_eq!(
        *negative.value(),
        QuantityOutcome::Removed { was_present: true }
    );

    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_favorites_are_idempotent() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let mut events = store.events();

    let first = store.add_to_favorites(sample_watch(1, 100)).await.unwrap();
    let second = store.add_to_favorites(sample_watch(1, 100)).await.unwrap();

    assert_eq!(*first.value(), FavoriteOutcome::Added);
    assert_eq!(*second.value(), FavoriteOutcome::AlreadyExists);
    assert_eq!(store.favorites().len(), 1);

    assert!(matches!(
        events.recv().await.unwrap(),
        StoreEvent::AddedToFavorites { .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        StoreEvent::AlreadyInFavorites { .. }
    ));

    assert!(store.remove_favorite(ProductId::new(1)).await.unwrap().into_value());
    assert!(!store.remove_favorite(ProductId::new(1)).await.unwrap().into_value());
    assert!(!store.is_favorite(ProductId::new(1)));
}

#[tokio::test]
async fn test_concurrent_adds_from_clones_are_not_lost() {
    let ctx = TestContext::new();
    let store = ctx.open().await;

    let mut tasks = Vec::new();
    for i in 0..40 {
        let handle = store.clone();
        tasks.push(tokio::spawn(async move {
            handle.add_to_cart(sample_watch(i % 4, 100)).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.cart().len(), 4);
    assert_eq!(store.summary().item_count, 40);

    store.shutdown().await.unwrap();
    let reopened = ctx.open().await;
    assert_eq!(reopened.summary().item_count, 40);
}

#[tokio::test]
async fn test_reload_picks_up_external_changes() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    store.add_to_cart(sample_watch(1, 100)).await.unwrap();

    ctx.write_raw("cart", "[]");
    assert_eq!(store.cart().len(), 1);

    store.reload().await.unwrap();
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_each_change() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    let mut snapshots = store.subscribe();

    store.add_to_cart(sample_watch(1, 100)).await.unwrap();
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().cart.len(), 1);

    store.clear_cart().await.unwrap();
    snapshots.changed().await.unwrap();
    assert!(snapshots.borrow_and_update().cart.is_empty());
}

#[tokio::test]
async fn test_closed_store_rejects_commands() {
    let ctx = TestContext::new();
    let store = ctx.open().await;
    store.shutdown().await.unwrap();

    let err = store.add_to_cart(sample_watch(1, 100)).await.unwrap_err();
    assert!(matches!(err, watchshop_store::StoreError::Closed));
}
