//! Async key-value persistence for the marketplace cart.
//!
//! The cart treats its storage medium as an opaque string store: it reads one
//! key at startup and overwrites that key with a full snapshot after every
//! change. This crate defines that seam ([`KeyValueStore`]) and ships two
//! adapters:
//!
//! - [`MemoryStore`] - process-local map, handy for tests and previews
//! - [`FileStore`] - a JSON document on disk that survives restarts
//!
//! # Example
//!
//! ```rust,ignore
//! use market_cache::{cache_key, FileStore, KeyValueStore};
//!
//! let store = FileStore::new("/var/lib/market/store.json");
//! let key = cache_key!("@GoMarketplace", "cart");
//!
//! store.set(&key, "[]").await?;
//! let raw: Option<String> = store.get(&key).await?;
//! ```

mod error;
mod file;
mod kv;
mod memory;

pub use error::CacheError;
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{CacheError, FileStore, KeyValueStore, MemoryStore};
}
