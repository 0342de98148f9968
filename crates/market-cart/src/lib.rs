//! Persisted, observable shopping cart state for the marketplace app.
//!
//! The crate keeps one authoritative [`Cart`] in memory, exposes the
//! mutations a storefront needs (add, increment, decrement, clear) and
//! mirrors every change to a [`KeyValueStore`](market_cache::KeyValueStore)
//! under `"<namespace>:cart"`, so the cart survives restarts.
//!
//! - **Cart**: [`Item`], [`CartLine`] and the immutable [`Cart`] value
//! - **Store**: [`CartStore`] with serialized mutations and ordered writes
//! - **Observation**: watch-channel subscription and [`CartObserver`] callbacks
//! - **Config**: [`CartConfig`] loaded from TOML or JSON
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use market_cache::MemoryStore;
//! use market_cart::prelude::*;
//!
//! let store = CartStore::open(Arc::new(MemoryStore::new()), CartConfig::default()).await?;
//!
//! let shirt = Item::new("a", "Shirt", "https://img/a.png", 10.0)?;
//! store.add_to_cart(shirt.clone()).await?;
//! store.add_to_cart(shirt).await?;
//!
//! assert_eq!(store.products().quantity_of(&"a".into()), 2);
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod ids;
pub mod observer;
pub mod retry;
pub mod snapshot;

mod store;
mod writer;

pub use cart::{Cart, CartLine, Item};
pub use config::{BackoffKind, CartConfig, RetryConfig, DEFAULT_NAMESPACE};
pub use error::CartError;
pub use ids::ProductId;
pub use observer::{CartObserver, ObserverId};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use store::CartStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::{Cart, CartLine, Item};
    pub use crate::config::CartConfig;
    pub use crate::error::CartError;
    pub use crate::ids::ProductId;
    pub use crate::observer::{CartObserver, ObserverId};
    pub use crate::store::CartStore;
}
