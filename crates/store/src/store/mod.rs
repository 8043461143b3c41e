//! The cart and favorites store.
//!
//! # Architecture
//!
//! [`CartStore`] is a handle. Opening a store loads both collections and
//! spawns a writer task that owns them together with the storage backend.
//! Every mutation is sent to that task as a command and applied strictly in
//! arrival order: apply in memory, write the whole collection, publish the new
//! snapshot, reply. Reads never wait for the writer; they see the most
//! recently published [`Snapshot`].
//!
//! # Persistence results
//!
//! A mutation either did not happen (`Err(StoreError)`), or it happened and
//! the caller learns whether the write reached storage through [`Applied`].
//! A collection whose write failed is marked dirty and is written again by
//! its next mutation or by [`CartStore::flush`].

mod events;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::instrument;

use watchshop_core::{
    Cart, CartAddOutcome, CartSummary, FavoriteOutcome, Favorites, Product, ProductId,
    QuantityOutcome,
};

use crate::error::{Result, StoreError};
use crate::storage::{KeyValueStorage, StorageError, StorageKeys};

pub use events::{Collection, StoreEvent};

use worker::{Command, Reply, Worker};

const EVENT_CAPACITY: usize = 64;

/// Outcome of a mutation that took effect in memory.
#[derive(Debug)]
pub enum Applied<T> {
    /// Applied and written to storage.
    Persisted(T),
    /// Applied in memory; the write failed after all retries.
    Unpersisted { value: T, error: StorageError },
}

impl<T> Applied<T> {
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Persisted(value) | Self::Unpersisted { value, .. } => value,
        }
    }

    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Persisted(value) | Self::Unpersisted { value, .. } => value,
        }
    }

    /// The write error, if the change was not persisted.
    #[must_use]
    pub const fn persist_error(&self) -> Option<&StorageError> {
        match self {
            Self::Persisted(_) => None,
            Self::Unpersisted { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        match self {
            Self::Persisted(value) => Applied::Persisted(f(value)),
            Self::Unpersisted { value, error } => Applied::Unpersisted {
                value: f(value),
                error,
            },
        }
    }
}

/// Point-in-time view of both collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub cart: Cart,
    pub favorites: Favorites,
    /// The cart differs from what storage holds.
    pub cart_dirty: bool,
    /// The favorites differ from what storage holds.
    pub favorites_dirty: bool,
}

/// Tuning for a store instance.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub keys: StorageKeys,
    /// Extra write attempts after a failed write.
    pub persist_retries: u32,
    /// Pause between write attempts.
    pub persist_backoff: Duration,
    /// Commands that may wait for the writer before callers are held back.
    pub queue_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            persist_retries: 2,
            persist_backoff: Duration::from_millis(50),
            queue_capacity: 64,
        }
    }
}

/// Handle to a cart and favorites store.
///
/// Cheap to clone; every clone talks to the same writer task. The task stops
/// once [`shutdown`](Self::shutdown) is called or every handle is dropped.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<Arc<Snapshot>>,
    events: broadcast::Sender<StoreEvent>,
}

impl CartStore {
    /// Load both collections from `storage` and start the writer task.
    ///
    /// Missing keys start empty. A value that cannot be read or decoded is
    /// logged and replaced by an empty collection; it is not reported to the
    /// caller. Must be called from within a Tokio runtime.
    #[instrument(skip_all, fields(cart_key = %options.keys.cart, favorites_key = %options.keys.favorites))]
    pub async fn open<S: KeyValueStorage>(storage: S, options: StoreOptions) -> Self {
        let (commands, receiver) = mpsc::channel(options.queue_capacity.max(1));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let worker = Worker::load(storage, &options, events.clone()).await;
        let state = worker.subscribe();
        tokio::spawn(worker.run(receiver));

        Self {
            inner: Arc::new(CartStoreInner {
                commands,
                state,
                events,
            }),
        }
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<Applied<T>> {
        let (reply, response) = oneshot::channel();
        self.inner
            .commands
            .send(command(reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Add one unit of `product` to the cart.
    ///
    /// An existing line with the same ID gets its quantity increased; none of
    /// its other fields change.
    ///
    /// # Errors
    ///
    /// `StoreError::Rejected` if the line's quantity cannot grow,
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: Product) -> Result<Applied<CartAddOutcome>> {
        self.request(|reply| Command::AddToCart { product, reply })
            .await
    }

    /// Remove the line for `id`. Yields whether a line was removed.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, id: ProductId) -> Result<Applied<bool>> {
        self.request(|reply| Command::RemoveFromCart { id, reply })
            .await
    }

    /// Set the quantity of the line for `id`; zero or below removes it.
    ///
    /// # Errors
    ///
    /// `StoreError::Rejected` if `quantity` is too large,
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> Result<Applied<QuantityOutcome>> {
        self.request(|reply| Command::UpdateQuantity {
            id,
            quantity,
            reply,
        })
        .await
    }

    /// Empty the cart and delete its persisted value.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Applied<()>> {
        self.request(|reply| Command::ClearCart { reply }).await
    }

    /// Take the lines of an order out of the cart.
    ///
    /// `ordered` is the cart as it was when the order was placed. Only those
    /// quantities are removed; anything added since stays. A cart left empty
    /// has its persisted value deleted, as with [`clear_cart`](Self::clear_cart).
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip_all, fields(ordered_lines = ordered.len()))]
    pub async fn remove_ordered(&self, ordered: Cart) -> Result<Applied<()>> {
        self.request(|reply| Command::RemoveOrdered { ordered, reply })
            .await
    }

    // -------------------------------------------------------------------------
    // Favorites
    // -------------------------------------------------------------------------

    /// Bookmark `product`. A product that is already a favorite is reported
    /// as `FavoriteOutcome::AlreadyExists` and nothing is written.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_favorites(&self, product: Product) -> Result<Applied<FavoriteOutcome>> {
        self.request(|reply| Command::AddToFavorites { product, reply })
            .await
    }

    /// Remove the favorite for `id`. Yields whether an entry was removed.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, id: ProductId) -> Result<Applied<bool>> {
        self.request(|reply| Command::RemoveFavorite { id, reply })
            .await
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Re-read both collections from storage, discarding in-memory state.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<()> {
        self.request(|reply| Command::Reload { reply })
            .await
            .map(Applied::into_value)
    }

    /// Write every dirty collection again.
    ///
    /// Yields `Persisted` when nothing is left dirty.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store has stopped.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<Applied<()>> {
        self.request(|reply| Command::Flush { reply }).await
    }

    /// Stop the writer task after it has handled every queued command.
    ///
    /// Later calls on any handle fail with `StoreError::Closed`.
    ///
    /// # Errors
    ///
    /// `StoreError::Closed` if the store had already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply })
            .await
            .map(Applied::into_value)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.state.borrow())
    }

    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().cart.clone()
    }

    #[must_use]
    pub fn favorites(&self) -> Favorites {
        self.inner.state.borrow().favorites.clone()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.state.borrow().cart.summary()
    }

    #[must_use]
    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.inner.state.borrow().favorites.contains(id)
    }

    /// Receiver notified of every snapshot published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        let mut receiver = self.inner.state.clone();
        receiver.mark_unchanged();
        receiver
    }

    /// Receiver for user-facing notifications.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }
}
