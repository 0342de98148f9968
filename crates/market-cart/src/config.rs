//! Cart store configuration.

use std::path::Path;
use std::time::Duration;

use market_cache::cache_key;
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::retry::{BackoffStrategy, RetryPolicy};

/// Namespace the cart key lives under unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "@GoMarketplace";

/// Configuration for a [`CartStore`](crate::CartStore).
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Deployment namespace; the snapshot key is `"<namespace>:cart"`.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// How many snapshots may wait for the writer before mutations suspend.
    #[serde(default = "default_writer_capacity")]
    pub writer_capacity: usize,

    /// Write retry settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_writer_capacity() -> usize {
    64
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            writer_capacity: default_writer_capacity(),
            retry: RetryConfig::default(),
        }
    }
}

impl CartConfig {
    /// Config with a custom namespace and defaults elsewhere.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Load config from a file (`.json`, anything else is read as TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CartError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| {
                CartError::Config(format!("failed to parse JSON {}: {}", path.display(), e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                CartError::Config(format!("failed to parse TOML {}: {}", path.display(), e))
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, CartError> {
        let config: Self =
            toml::from_str(content).map_err(|e| CartError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.namespace.trim().is_empty() {
            return Err(CartError::Config("namespace must not be empty".to_string()));
        }
        if self.writer_capacity == 0 {
            return Err(CartError::Config(
                "writer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Key the cart snapshot is stored under.
    pub fn storage_key(&self) -> String {
        cache_key!(self.namespace.as_str(), "cart")
    }
}

/// Write retry settings as they appear in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first failed write; 0 disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Delay shape between retries.
    #[serde(default)]
    pub backoff: BackoffKind,
}

/// Backoff shape selectable from config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Doubling from `base_delay_ms` up to `max_delay_ms`.
    #[default]
    Exponential,
    /// `base_delay_ms` before every retry.
    Fixed,
    /// No delay.
    Immediate,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    50
}

fn default_max_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff: BackoffKind::default(),
        }
    }
}

impl RetryConfig {
    /// Runtime retry policy for these settings.
    pub fn policy(&self) -> RetryPolicy {
        let backoff = match self.backoff {
            BackoffKind::Exponential => BackoffStrategy::Exponential {
                base: Duration::from_millis(self.base_delay_ms),
                max: Duration::from_millis(self.max_delay_ms),
            },
            BackoffKind::Fixed => BackoffStrategy::Fixed(Duration::from_millis(self.base_delay_ms)),
            BackoffKind::Immediate => BackoffStrategy::Immediate,
        };
        RetryPolicy::new(self.max_attempts, backoff)
    }
}
