//! Change notification for cart consumers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::cart::Cart;

/// Observer trait for cart changes.
///
/// Any `Fn(&Cart) + Send + Sync` closure is an observer.
pub trait CartObserver: Send + Sync {
    /// Called with the new cart after a change has been published.
    fn on_change(&self, cart: &Cart);
}

impl<F> CartObserver for F
where
    F: Fn(&Cart) + Send + Sync,
{
    fn on_change(&self, cart: &Cart) {
        self(cart)
    }
}

/// Handle returned by [`CartStore::observe`](crate::CartStore::observe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers, notified in registration order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<Vec<(ObserverId, Arc<dyn CartObserver>)>>,
}

impl ObserverRegistry {
    pub(crate) fn register(&self, observer: Arc<dyn CartObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    pub(crate) fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let len_before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() < len_before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Notify every observer. The list is copied first so an observer may
    /// register or unregister others from inside its callback.
    pub(crate) fn notify(&self, cart: &Cart) {
        let observers: Vec<Arc<dyn CartObserver>> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();

        for observer in observers {
            observer.on_change(cart);
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}
