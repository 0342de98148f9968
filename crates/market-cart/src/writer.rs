//! Ordered background writer for cart snapshots.
//!
//! One task owns every write to the snapshot key. Snapshots are written in
//! the order they were queued, so the last queued snapshot is always the last
//! one the adapter sees.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use market_cache::KeyValueStore;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::error::CartError;
use crate::retry::RetryPolicy;

/// Messages for the writer actor.
enum WriterMessage {
    Write { snapshot: String },
    Flush { tx: oneshot::Sender<()> },
    Shutdown { tx: oneshot::Sender<()> },
}

/// Handle to the writer task.
pub(crate) struct SnapshotWriter {
    sender: mpsc::Sender<WriterMessage>,
    failures: Arc<AtomicU64>,
}

impl SnapshotWriter {
    /// Spawn the writer task on the current Tokio runtime.
    pub(crate) fn spawn(
        adapter: Arc<dyn KeyValueStore>,
        key: String,
        retry: RetryPolicy,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let failures = Arc::new(AtomicU64::new(0));

        let actor = WriterActor {
            receiver: rx,
            adapter,
            key,
            retry,
            failures: Arc::clone(&failures),
        };
        tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            sender: tx,
            failures,
        }
    }

    /// Reserve a queue slot for one snapshot. Suspends only while the queue
    /// is full; dropping the future before it resolves reserves nothing.
    pub(crate) async fn reserve(&self) -> Result<SnapshotSlot<'_>, CartError> {
        let permit = self.sender.reserve().await.map_err(|_| CartError::Closed)?;
        Ok(SnapshotSlot { permit })
    }

    /// Wait until everything queued before this call has been handled.
    pub(crate) async fn flush(&self) -> Result<(), CartError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WriterMessage::Flush { tx })
            .await
            .map_err(|_| CartError::Closed)?;
        rx.await.map_err(|_| CartError::Closed)
    }

    /// Drain the queue and stop the task.
    pub(crate) async fn shutdown(&self) -> Result<(), CartError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WriterMessage::Shutdown { tx })
            .await
            .map_err(|_| CartError::Closed)?;
        rx.await.map_err(|_| CartError::Closed)
    }

    /// Snapshots dropped after exhausting retries.
    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// A reserved place in the writer queue.
pub(crate) struct SnapshotSlot<'a> {
    permit: mpsc::Permit<'a, WriterMessage>,
}

impl SnapshotSlot<'_> {
    /// Queue the snapshot. Never suspends.
    pub(crate) fn write(self, snapshot: String) {
        self.permit.send(WriterMessage::Write { snapshot });
    }
}

struct WriterActor {
    receiver: mpsc::Receiver<WriterMessage>,
    adapter: Arc<dyn KeyValueStore>,
    key: String,
    retry: RetryPolicy,
    failures: Arc<AtomicU64>,
}

impl WriterActor {
    async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                WriterMessage::Write { snapshot } => self.write(&snapshot).await,
                WriterMessage::Flush { tx } => {
                    let _ = tx.send(());
                }
                WriterMessage::Shutdown { tx } => {
                    self.receiver.close();
                    // Anything queued before the close is still written.
                    while let Some(msg) = self.receiver.recv().await {
                        match msg {
                            WriterMessage::Write { snapshot } => self.write(&snapshot).await,
                            WriterMessage::Flush { tx } | WriterMessage::Shutdown { tx } => {
                                let _ = tx.send(());
                            }
                        }
                    }
                    let _ = tx.send(());
                    break;
                }
            }
        }
        debug!(key = %self.key, "snapshot writer stopped");
    }

    async fn write(&self, snapshot: &str) {
        let mut attempt = 0;
        loop {
            match self.adapter.set(&self.key, snapshot).await {
                Ok(()) => {
                    debug!(key = %self.key, bytes = snapshot.len(), attempt, "cart snapshot persisted");
                    return;
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff.delay_for_attempt(attempt);
                    warn!(
                        key = %self.key,
                        attempt,
                        delay_ms = millis(delay),
                        error = %e,
                        "cart snapshot write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        key = %self.key,
                        attempts = attempt + 1,
                        error = %e,
                        "giving up on cart snapshot write; in-memory cart stays authoritative"
                    );
                    return;
                }
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
