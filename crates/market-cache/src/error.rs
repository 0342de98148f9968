//! Cache error types.

use thiserror::Error;

/// Errors that can occur when talking to a key-value store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to read or write the backing medium.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),
}
