//! Key-value store port
//!
//! The persistence contract the engine needs for cursors and the result cache.
//! Adapters decide whether values live in a file or a table.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Port trait for JSON key-value persistence
///
/// `load` must succeed once before `get`/`put` are used; adapters report
/// `StoreError::NotLoaded` otherwise.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Initialize the store (create backing file/table if needed, read state)
    async fn load(&self) -> Result<(), StoreError>;

    /// Fetch a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Insert or replace a value
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Persist anything still pending. Called on shutdown.
    async fn flush(&self) -> Result<(), StoreError>;
}
