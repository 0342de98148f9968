//! Shared test adapters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use market_cache::{CacheError, KeyValueStore, MemoryStore};
use market_cart::{CartConfig, RetryConfig};
use tokio::sync::{Notify, Semaphore};

/// Memory-backed store that can fail writes and hold reads.
#[derive(Default)]
pub struct TestStore {
    pub inner: MemoryStore,
    fail_sets: AtomicUsize,
    sets: AtomicUsize,
    gate: Option<Gate>,
}

struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl TestStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `n` writes.
    pub fn failing(inner: MemoryStore, n: usize) -> Self {
        let store = Self::new(inner);
        store.fail_sets.store(n, Ordering::SeqCst);
        store
    }

    /// Block every `get` until `release` is notified; `entered` fires when a
    /// `get` starts waiting.
    pub fn gated(inner: MemoryStore) -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Self {
            gate: Some(Gate {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
            ..Self::new(inner)
        };
        (store, entered, release)
    }

    /// Successful writes so far.
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for TestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let failed = self
            .fail_sets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CacheError::StoreError("disk full".to_string()));
        }
        self.inner.set(key, value).await?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Memory-backed store whose writes wait for a permit from `gate`.
pub struct BlockingStore {
    pub inner: MemoryStore,
    pub gate: Arc<Semaphore>,
}

impl BlockingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl KeyValueStore for BlockingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CacheError::StoreError(e.to_string()))?;
        self.inner.set(key, value).await
    }
}

/// Default config with fast retries.
pub fn fast_config(max_attempts: u32) -> CartConfig {
    CartConfig {
        retry: RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..RetryConfig::default()
        },
        ..CartConfig::default()
    }
}

pub const SHORT: Duration = Duration::from_secs(5);
