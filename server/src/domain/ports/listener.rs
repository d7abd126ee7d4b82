//! Listener port
//!
//! A live subscriber that receives every published metrics snapshot.
//! The transport (websocket today) implements this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ListenerError;

/// Unique handle for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port trait for broadcast listeners
#[async_trait]
pub trait Listener: Send + Sync {
    fn id(&self) -> ListenerId;

    /// Whether the underlying connection can still accept messages
    fn is_open(&self) -> bool;

    /// Deliver one serialized payload
    async fn send(&self, payload: &str) -> Result<(), ListenerError>;
}
