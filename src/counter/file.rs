//! JSON-file counter store.
//!
//! The file holds a flat JSON object of string values. It is read on every
//! `get` and rewritten on every `put`, so several proxy processes may share
//! one file (with the same lost-update tolerance as the counter itself).

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{CounterError, KvStore};

/// Key-value store persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, CounterError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(CounterError::Io(e)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(CounterError::Corrupt(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                other
            ))),
        }
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CounterError> {
        let map = self.load().await?;
        Ok(map.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CounterError> {
        let mut map = self.load().await?;
        map.insert(key.to_string(), Value::String(value));

        let content = serde_json::to_string_pretty(&map)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::trace!(path = %self.path.display(), key, "Counter store written");
        Ok(())
    }
}
