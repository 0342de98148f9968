//! The key-value seam the cart persists through.

use async_trait::async_trait;

use crate::CacheError;

/// Opaque async string store keyed by string.
///
/// Implementations own only the stored text; they never interpret it. Both
/// methods may suspend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// use market_cache::cache_key;
///
/// let key = cache_key!("@GoMarketplace", "cart");
/// assert_eq!(key, "@GoMarketplace:cart");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_cache_key_single_part() {
        assert_eq!(cache_key!("@GoMarketplace", "cart"), "@GoMarketplace:cart");
    }

    #[test]
    fn test_cache_key_many_parts() {
        let user = 42;
        assert_eq!(cache_key!("shop", "cart", user), "shop:cart:42");
    }
}
