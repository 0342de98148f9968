//! Cart error types.

use thiserror::Error;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CartError {
    /// Item data violates the catalog contract (empty id, bad price).
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The store was shut down; no further mutations are accepted.
    #[error("Cart store is closed")]
    Closed,
}
