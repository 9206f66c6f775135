//! Process-local counter store.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CounterError, KvStore};

/// In-memory key-value store. Values are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CounterError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }
}
