//! Page Cursor Store
//!
//! Typed access to per (account, repository, metric kind) page cursors on top
//! of the key-value store. Storage failures never propagate: a failed read is
//! an absent cursor (cold restart of that pagination), a failed write is
//! logged and dropped.

use std::sync::Arc;

use crate::domain::entities::cursor::cursor_key;
use crate::domain::entities::{MetricKind, PageCursor};
use crate::domain::ports::KeyValueStore;

pub struct CursorStore<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> CursorStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn load(&self, account: &str, repo: &str, kind: MetricKind) -> Option<PageCursor> {
        let key = cursor_key(account, repo, kind);

        match self.store.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(cursor) => Some(cursor),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding unreadable page cursor");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Unable to read page cursor");
                None
            }
        }
    }

    pub async fn save(&self, account: &str, repo: &str, kind: MetricKind, cursor: PageCursor) {
        let key = cursor_key(account, repo, kind);

        let value = match serde_json::to_value(cursor) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Unable to serialize page cursor");
                return;
            }
        };

        if let Err(e) = self.store.put(&key, value).await {
            tracing::error!(key = %key, error = %e, "Unable to store page cursor");
        }
    }
}
