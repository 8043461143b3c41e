//! The single writer behind every `CartStore` handle.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use watchshop_core::{
    Cart, CartAddOutcome, FavoriteOutcome, Favorites, Product, ProductId, Quantity,
    QuantityOutcome,
};

use super::events::{Collection, StoreEvent};
use super::{Applied, Snapshot, StoreOptions};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, StorageError, StorageKeys};

pub(super) type Reply<T> = oneshot::Sender<Result<Applied<T>, StoreError>>;

pub(super) enum Command {
    AddToCart {
        product: Product,
        reply: Reply<CartAddOutcome>,
    },
    RemoveFromCart {
        id: ProductId,
        reply: Reply<bool>,
    },
    UpdateQuantity {
        id: ProductId,
        quantity: i64,
        reply: Reply<QuantityOutcome>,
    },
    ClearCart {
        reply: Reply<()>,
    },
    RemoveOrdered {
        ordered: Cart,
        reply: Reply<()>,
    },
    AddToFavorites {
        product: Product,
        reply: Reply<FavoriteOutcome>,
    },
    RemoveFavorite {
        id: ProductId,
        reply: Reply<bool>,
    },
    Reload {
        reply: Reply<()>,
    },
    Flush {
        reply: Reply<()>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

enum Write {
    Set(String),
    Remove,
}

pub(super) struct Worker<S> {
    storage: S,
    keys: StorageKeys,
    retries: u32,
    backoff: Duration,
    cart: Cart,
    favorites: Favorites,
    cart_dirty: bool,
    /// The cart was emptied and its key must be removed, not written.
    cart_removal_pending: bool,
    favorites_dirty: bool,
    events: broadcast::Sender<StoreEvent>,
    state: watch::Sender<Arc<Snapshot>>,
}

impl<S: KeyValueStorage> Worker<S> {
    pub(super) async fn load(
        storage: S,
        options: &StoreOptions,
        events: broadcast::Sender<StoreEvent>,
    ) -> Self {
        let cart: Cart = load_collection(&storage, &options.keys.cart).await;
        let favorites: Favorites = load_collection(&storage, &options.keys.favorites).await;
        info!(
            cart_lines = cart.len(),
            favorites = favorites.len(),
            "Loaded cart and favorites"
        );

        let (state, _) = watch::channel(Arc::new(Snapshot {
            cart: cart.clone(),
            favorites: favorites.clone(),
            cart_dirty: false,
            favorites_dirty: false,
        }));

        Self {
            storage,
            keys: options.keys.clone(),
            retries: options.persist_retries,
            backoff: options.persist_backoff,
            cart,
            favorites,
            cart_dirty: false,
            cart_removal_pending: false,
            favorites_dirty: false,
            events,
            state,
        }
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.state.subscribe()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            cart: self.cart.clone(),
            favorites: self.favorites.clone(),
            cart_dirty: self.cart_dirty,
            favorites_dirty: self.favorites_dirty,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            if let Command::Shutdown { reply } = command {
                commands.close();
                let _ = reply.send(Ok(Applied::Persisted(())));
                debug!("Cart store writer stopping");
                break;
            }
            self.handle(command).await;
        }
    }

    /// Publish the new state, then answer the caller.
    ///
    /// Publishing first guarantees a caller that awaited a mutation reads
    /// its effect. The reply is dropped silently when the caller has gone
    /// away; the mutation has been applied either way.
    fn reply<T>(&self, reply: Reply<T>, result: Result<Applied<T>, StoreError>) {
        self.state.send_replace(Arc::new(self.snapshot()));
        let _ = reply.send(result);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::AddToCart { product, reply } => {
                let result = self.add_to_cart(product).await;
                self.reply(reply, result);
            }
            Command::RemoveFromCart { id, reply } => {
                let removed = self.cart.remove(id);
                debug!(product_id = %id, removed, "Remove from cart");
                let result = Ok(self.persist_cart(removed).await);
                self.reply(reply, result);
            }
            Command::UpdateQuantity {
                id,
                quantity,
                reply,
            } => {
                let result = match self.cart.set_quantity(id, quantity) {
                    Ok(outcome) => Ok(self.persist_cart(outcome).await),
                    Err(e) => {
                        warn!(product_id = %id, quantity, error = %e, "Quantity update rejected");
                        Err(StoreError::from(e))
                    }
                };
                self.reply(reply, result);
            }
            Command::ClearCart { reply } => {
                self.cart.clear();
                let result = Ok(self.persist_cart_change().await);
                self.reply(reply, result);
            }
            Command::RemoveOrdered { ordered, reply } => {
                self.cart.remove_ordered(&ordered);
                debug!(ordered_lines = ordered.len(), remaining = self.cart.len(), "Remove ordered lines");
                let result = Ok(self.persist_cart_change().await);
                self.reply(reply, result);
            }
            Command::AddToFavorites { product, reply } => {
                let result = Ok(self.add_to_favorites(product).await);
                self.reply(reply, result);
            }
            Command::RemoveFavorite { id, reply } => {
                let removed = self.favorites.remove(id);
                debug!(product_id = %id, removed, "Remove favorite");
                let result = Ok(self.persist_favorites(removed).await);
                self.reply(reply, result);
            }
            Command::Reload { reply } => {
                self.cart = load_collection(&self.storage, &self.keys.cart).await;
                self.favorites = load_collection(&self.storage, &self.keys.favorites).await;
                self.cart_dirty = false;
                self.cart_removal_pending = false;
                self.favorites_dirty = false;
                info!(
                    cart_lines = self.cart.len(),
                    favorites = self.favorites.len(),
                    "Reloaded cart and favorites"
                );
                self.reply(reply, Ok(Applied::Persisted(())));
            }
            Command::Flush { reply } => {
                let result = Ok(self.flush().await);
                self.reply(reply, result);
            }
            Command::Shutdown { reply } => {
                self.reply(reply, Ok(Applied::Persisted(())));
            }
        }
    }

    async fn add_to_cart(&mut self, product: Product) -> Result<Applied<CartAddOutcome>, StoreError> {
        let id = product.id;
        let name = product.name.clone();
        let outcome = self.cart.add(product).map_err(|e| {
            warn!(product_id = %id, error = %e, "Add to cart rejected");
            StoreError::from(e)
        })?;

        let quantity = match outcome {
            CartAddOutcome::Inserted => Quantity::ONE,
            CartAddOutcome::Incremented { quantity } => quantity,
        };
        let applied = self.persist_cart(outcome).await;

        info!(product_id = %id, %quantity, "Added to cart");
        let _ = self.events.send(StoreEvent::AddedToCart { id, name, quantity });
        Ok(applied)
    }

    async fn add_to_favorites(&mut self, product: Product) -> Applied<FavoriteOutcome> {
        let id = product.id;
        let name = product.name.clone();

        match self.favorites.add(product) {
            FavoriteOutcome::AlreadyExists => {
                info!(product_id = %id, "Already in favorites");
                let _ = self
                    .events
                    .send(StoreEvent::AlreadyInFavorites { id, name });
                // Nothing changed, but an earlier failed write is still owed.
                if self.favorites_dirty {
                    self.persist_favorites(FavoriteOutcome::AlreadyExists).await
                } else {
                    Applied::Persisted(FavoriteOutcome::AlreadyExists)
                }
            }
            FavoriteOutcome::Added => {
                let applied = self.persist_favorites(FavoriteOutcome::Added).await;
                info!(product_id = %id, "Added to favorites");
                let _ = self.events.send(StoreEvent::AddedToFavorites { id, name });
                applied
            }
        }
    }

    async fn flush(&mut self) -> Applied<()> {
        let mut failure = None;
        if self.cart_dirty {
            let result = self.write_collection(Collection::Cart).await;
            if let Applied::Unpersisted { error, .. } = self.settle(Collection::Cart, (), result) {
                failure = Some(error);
            }
        }
        if self.favorites_dirty {
            let result = self.write_collection(Collection::Favorites).await;
            if let Applied::Unpersisted { error, .. } =
                self.settle(Collection::Favorites, (), result)
            {
                failure.get_or_insert(error);
            }
        }
        match failure {
            None => Applied::Persisted(()),
            Some(error) => Applied::Unpersisted { value: (), error },
        }
    }

    async fn persist_cart<T>(&mut self, value: T) -> Applied<T> {
        let result = self.write_collection(Collection::Cart).await;
        self.settle(Collection::Cart, value, result)
    }

    /// Persist a cart change that may have emptied it.
    ///
    /// An emptied cart has its key removed, and keeps owing that removal
    /// until a write succeeds.
    async fn persist_cart_change(&mut self) -> Applied<()> {
        if self.cart.is_empty() {
            self.cart_removal_pending = true;
            let _ = self.events.send(StoreEvent::CartCleared);
        }
        self.persist_cart(()).await
    }

    async fn persist_favorites<T>(&mut self, value: T) -> Applied<T> {
        let result = self.write_collection(Collection::Favorites).await;
        self.settle(Collection::Favorites, value, result)
    }

    /// Serialize the full collection and write it.
    async fn write_collection(&self, collection: Collection) -> Result<(), StorageError> {
        let write = match collection {
            Collection::Cart if self.cart_removal_pending && self.cart.is_empty() => Write::Remove,
            Collection::Cart => Write::Set(encode(&self.cart)?),
            Collection::Favorites => Write::Set(encode(&self.favorites)?),
        };
        self.write(collection, write).await
    }

    /// Perform one write, retrying failed attempts.
    async fn write(&self, collection: Collection, write: Write) -> Result<(), StorageError> {
        let key = self.key(collection);
        let mut attempt = 0;
        loop {
            let result = match &write {
                Write::Set(value) => self.storage.set(key, value).await,
                Write::Remove => self.storage.remove(key).await,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(key, attempt, error = %e, "Storage write failed, retrying");
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Record the write result on the collection's dirty flag.
    fn settle<T>(
        &mut self,
        collection: Collection,
        value: T,
        result: Result<(), StorageError>,
    ) -> Applied<T> {
        let dirty = result.is_err();
        match collection {
            Collection::Cart => {
                self.cart_dirty = dirty;
                self.cart_removal_pending &= dirty;
            }
            Collection::Favorites => self.favorites_dirty = dirty,
        }
        match result {
            Ok(()) => Applied::Persisted(value),
            Err(error) => {
                error!(%collection, key = self.key(collection), error = %error, "Failed to persist collection");
                let _ = self.events.send(StoreEvent::PersistFailed {
                    collection,
                    error: error.to_string(),
                });
                Applied::Unpersisted { value, error }
            }
        }
    }

    fn key(&self, collection: Collection) -> &str {
        match collection {
            Collection::Cart => &self.keys.cart,
            Collection::Favorites => &self.keys.favorites,
        }
    }
}

fn encode<T: Serialize>(collection: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(collection)?)
}

/// Read and decode one collection, falling back to empty.
async fn load_collection<S, T>(storage: &S, key: &str) -> T
where
    S: KeyValueStorage,
    T: DeserializeOwned + Default,
{
    match storage.get(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "Discarding undecodable persisted value");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            error!(key, error = %e, "Failed to read persisted value");
            T::default()
        }
    }
}
