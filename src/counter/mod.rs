//! Request counter subsystem.
//!
//! # Data Flow
//! ```text
//! successful forward
//!     → RequestCounter::increment (read, +1, write)
//!     → KvStore::get / KvStore::put under "total_requests"
//!
//! help page
//!     → RequestCounter::read (never mutates)
//! ```
//!
//! # Design Decisions
//! - The store is injected into the handler, never a global
//! - No backend configured is a valid deployment: reads are 0, increments are no-ops
//! - Read-then-write is not atomic; lost updates under concurrency are accepted

pub mod file;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{CounterBackend, CounterConfig};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key under which the total number of forwarded requests is stored.
pub const TOTAL_REQUESTS_KEY: &str = "total_requests";

/// Errors raised by counter backends.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A minimal string key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CounterError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: String) -> Result<(), CounterError>;
}

/// Tally of successfully forwarded requests.
#[derive(Clone, Default)]
pub struct RequestCounter {
    store: Option<Arc<dyn KvStore>>,
}

impl RequestCounter {
    /// Counter backed by the given store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Counter with no backend; always reads zero.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Build the counter described by the configuration.
    pub fn from_config(config: &CounterConfig) -> Self {
        match config.backend {
            CounterBackend::None => Self::disabled(),
            CounterBackend::Memory => Self::new(Arc::new(MemoryStore::new())),
            CounterBackend::File => {
                // Validation guarantees a path for the file backend.
                let path = config.path.clone().unwrap_or_default();
                Self::new(Arc::new(FileStore::new(path)))
            }
        }
    }

    /// Whether a backend is configured.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Current total. Absent or non-numeric values read as zero.
    pub async fn read(&self) -> Result<u64, CounterError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let raw = store.get(TOTAL_REQUESTS_KEY).await?;
        Ok(parse_count(raw.as_deref()))
    }

    /// Add one to the total and return the new value.
    pub async fn increment(&self) -> Result<u64, CounterError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let current = parse_count(store.get(TOTAL_REQUESTS_KEY).await?.as_deref());
        let next = current.saturating_add(1);
        store.put(TOTAL_REQUESTS_KEY, next.to_string()).await?;
        Ok(next)
    }
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_counter_reads_zero() {
        let counter = RequestCounter::disabled();
        assert!(!counter.is_enabled());
        assert_eq!(counter.increment().await.unwrap(), 0);
        assert_eq!(counter.read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_by_one() {
        let counter = RequestCounter::new(Arc::new(MemoryStore::new()));
        assert_eq!(counter.read().await.unwrap(), 0);
        assert_eq!(counter.increment().await.unwrap(), 1);
        assert_eq!(counter.increment().await.unwrap(), 2);
        assert_eq!(counter.read().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_garbage_value_counts_as_zero() {
        let store = Arc::new(MemoryStore::new());
        store.put(TOTAL_REQUESTS_KEY, "NaN".into()).await.unwrap();

        let counter = RequestCounter::new(store.clone());
        assert_eq!(counter.read().await.unwrap(), 0);
        counter.increment().await.unwrap();
        assert_eq!(store.get(TOTAL_REQUESTS_KEY).await.unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_from_config() {
        let config = CounterConfig::default();
        assert!(!RequestCounter::from_config(&config).is_enabled());

        let config = CounterConfig {
            backend: CounterBackend::Memory,
            path: None,
        };
        assert!(RequestCounter::from_config(&config).is_enabled());
    }
}
