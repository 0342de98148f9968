//! The cart store: authoritative cart state plus its persisted snapshot.

use std::sync::Arc;

use market_cache::KeyValueStore;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::cart::{Cart, Item};
use crate::config::CartConfig;
use crate::error::CartError;
use crate::ids::ProductId;
use crate::observer::{CartObserver, ObserverId, ObserverRegistry};
use crate::snapshot;
use crate::writer::SnapshotWriter;

#[derive(Debug, Default)]
struct StoreState {
    initialized: bool,
    closed: bool,
}

/// Owns the cart and keeps the stored snapshot in step with it.
///
/// Mutations are serialized through one FIFO lock, so every mutation sees
/// the result of the one before it. Each mutation runs in two phases:
///
/// 1. derive the new cart from the current one and **publish** it (watch
///    channel, then observers, in mutation order);
/// 2. **enqueue** the full serialized cart for the background writer, into a
///    queue slot reserved before phase 1.
///
/// The caller is never blocked on storage I/O beyond queue backpressure, and
/// a failed write is never rolled back into memory. The writer retries per
/// [`RetryConfig`](crate::RetryConfig) and counts snapshots it gave up on.
///
/// The stored snapshot is read once. [`initialize`](Self::initialize) does
/// it eagerly; otherwise the first mutation does it under the same lock, so
/// a mutation issued before the load finishes is applied on top of the
/// loaded cart, never underneath it.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use market_cache::FileStore;
/// use market_cart::prelude::*;
///
/// let adapter = Arc::new(FileStore::new("cart.json"));
/// let store = CartStore::open(adapter, CartConfig::default()).await?;
///
/// store.observe(|cart: &Cart| println!("{} items", cart.item_count()));
/// store.add_to_cart(Item::new("a", "Shirt", "https://img/a.png", 10.0)?).await?;
/// store.decrement(&"a".into()).await?;
/// ```
pub struct CartStore {
    key: String,
    adapter: Arc<dyn KeyValueStore>,
    state: Mutex<StoreState>,
    current: watch::Sender<Arc<Cart>>,
    observers: ObserverRegistry,
    writer: SnapshotWriter,
}

impl CartStore {
    /// Create a store with an empty cart. Spawns the snapshot writer, so it
    /// must be called from within a Tokio runtime.
    pub fn new(adapter: Arc<dyn KeyValueStore>, config: CartConfig) -> Result<Self, CartError> {
        config.validate()?;
        let key = config.storage_key();
        let writer = SnapshotWriter::spawn(
            Arc::clone(&adapter),
            key.clone(),
            config.retry.policy(),
            config.writer_capacity,
        );
        let (current, _) = watch::channel(Arc::new(Cart::new()));

        Ok(Self {
            key,
            adapter,
            state: Mutex::new(StoreState::default()),
            current,
            observers: ObserverRegistry::default(),
            writer,
        })
    }

    /// Create a store and load the stored snapshot.
    pub async fn open(
        adapter: Arc<dyn KeyValueStore>,
        config: CartConfig,
    ) -> Result<Self, CartError> {
        let store = Self::new(adapter, config)?;
        store.initialize().await?;
        Ok(store)
    }

    /// Load the stored snapshot and adopt it as the current cart.
    ///
    /// A missing, unreadable or unparsable snapshot yields an empty cart.
    /// Only the first call reads storage; later calls return the current
    /// cart.
    pub async fn initialize(&self) -> Result<Arc<Cart>, CartError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(CartError::Closed);
        }
        self.ensure_loaded(&mut state).await;
        Ok(self.products())
    }

    /// Add one unit of `item`.
    ///
    /// An item already in the cart is incremented; otherwise it is appended
    /// with quantity 1.
    pub async fn add_to_cart(&self, item: Item) -> Result<Arc<Cart>, CartError> {
        item.validate()?;
        self.mutate("add_to_cart", item.id.as_str(), |cart| Some(cart.with_added(&item)))
            .await
    }

    /// Add one unit to the line for `id`. Unknown ids leave the cart as is.
    pub async fn increment(&self, id: &ProductId) -> Result<Arc<Cart>, CartError> {
        self.mutate("increment", id.as_str(), |cart| cart.with_incremented(id))
            .await
    }

    /// Remove one unit from the line for `id`, dropping the line at zero.
    /// Unknown ids leave the cart as is.
    pub async fn decrement(&self, id: &ProductId) -> Result<Arc<Cart>, CartError> {
        self.mutate("decrement", id.as_str(), |cart| cart.with_decremented(id))
            .await
    }

    /// Remove every line.
    pub async fn clear(&self) -> Result<Arc<Cart>, CartError> {
        self.mutate("clear", "*", |cart| {
            (!cart.is_empty()).then(Cart::new)
        })
        .await
    }

    /// The cart as of the latest completed mutation.
    pub fn products(&self) -> Arc<Cart> {
        Arc::clone(&self.current.borrow())
    }

    /// Receiver that is marked changed whenever a new cart is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.current.subscribe()
    }

    /// Register an observer, called with every newly published cart.
    pub fn observe<O>(&self, observer: O) -> ObserverId
    where
        O: CartObserver + 'static,
    {
        self.observers.register(Arc::new(observer))
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// Wait until every snapshot queued so far has been handed to storage.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.writer.flush().await
    }

    /// Stop accepting mutations and drain pending writes.
    ///
    /// Afterwards mutations fail with [`CartError::Closed`]; queries keep
    /// returning the last cart. Calling it twice is harmless.
    pub async fn shutdown(&self) -> Result<(), CartError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        self.writer.shutdown().await?;
        info!(key = %self.key, "cart store shut down");
        Ok(())
    }

    /// Snapshots that could not be written after all retries.
    pub fn persist_failures(&self) -> u64 {
        self.writer.failures()
    }

    /// Key the snapshot is stored under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    async fn ensure_loaded(&self, state: &mut StoreState) {
        if state.initialized {
            return;
        }

        let cart = match self.adapter.get(&self.key).await {
            Ok(Some(raw)) => match snapshot::decode(&raw) {
                Ok(cart) => {
                    info!(key = %self.key, lines = cart.len(), "restored cart snapshot");
                    cart
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "stored cart snapshot is unreadable, starting empty");
                    Cart::new()
                }
            },
            Ok(None) => {
                debug!(key = %self.key, "no stored cart snapshot, starting empty");
                Cart::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read cart snapshot, starting empty");
                Cart::new()
            }
        };

        state.initialized = true;
        self.publish(Arc::new(cart));
    }

    async fn mutate<F>(
        &self,
        op: &'static str,
        subject: &str,
        change: F,
    ) -> Result<Arc<Cart>, CartError>
    where
        F: FnOnce(&Cart) -> Option<Cart>,
    {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(CartError::Closed);
        }
        self.ensure_loaded(&mut state).await;

        let current = self.products();
        let Some(next) = change(&current) else {
            debug!(op, subject, "no matching cart line, cart unchanged");
            return Ok(current);
        };

        let encoded = snapshot::encode(&next)?;
        // Last suspension point: past it the mutation publishes and queues
        // its snapshot without awaiting, so a dropped call changes nothing.
        let slot = self.writer.reserve().await?;
        let next = Arc::new(next);
        debug!(
            op,
            subject,
            lines = next.len(),
            items = next.item_count(),
            "cart updated"
        );

        self.publish(Arc::clone(&next));
        slot.write(encoded);
        Ok(next)
    }

    fn publish(&self, cart: Arc<Cart>) {
        self.current.send_replace(Arc::clone(&cart));
        self.observers.notify(&cart);
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &self.current.borrow().len())
            .field("observers", &self.observers)
            .finish()
    }
}
