//! File-backed key-value store
//!
//! Keeps the whole map in memory and rewrites a single JSON object file on
//! every `put`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::ports::KeyValueStore;
use crate::error::StoreError;

/// JSON file implementation of KeyValueStore
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Option<HashMap<String, Value>>>,
    /// Set when the last file write failed and memory is ahead of disk
    dirty: AtomicBool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: RwLock::new(None),
            dirty: AtomicBool::new(false),
        }
    }

    async fn write_file(&self, values: &HashMap<String, Value>) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(values)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self) -> Result<(), StoreError> {
        let values = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Store file does not exist, creating");
                let empty = HashMap::new();
                self.write_file(&empty).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };

        *self.values.write().await = Some(values);
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.read().await;
        let values = values.as_ref().ok_or(StoreError::NotLoaded)?;
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        let values = values.as_mut().ok_or(StoreError::NotLoaded)?;
        values.insert(key.to_string(), value);

        let result = self.write_file(values).await;
        self.dirty.store(result.is_err(), Ordering::SeqCst);
        result
    }

    async fn flush(&self) -> Result<(), StoreError> {
        if !self.dirty.load(Ordering::SeqCst) {
            return Ok(());
        }

        let values = self.values.read().await;
        let values = values.as_ref().ok_or(StoreError::NotLoaded)?;
        self.write_file(values).await?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }
}
