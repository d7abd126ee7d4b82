//! Websocket listener adapter
//!
//! Bridges a websocket connection to the `Listener` port. The socket itself is
//! owned by the connection task in `handlers::ws`; this side only queues
//! outgoing payloads onto the channel that task drains.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::ports::{Listener, ListenerId};
use crate::error::ListenerError;

/// Listener backed by a websocket connection's outbound queue
pub struct WsListener {
    id: ListenerId,
    outbound: mpsc::UnboundedSender<String>,
    open: AtomicBool,
}

impl WsListener {
    /// Create a listener and the receiving end the connection task drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let listener = Self {
            id: ListenerId::new(),
            outbound,
            open: AtomicBool::new(true),
        };
        (listener, rx)
    }

    /// Mark the connection closed (transport close notification)
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Listener for WsListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.outbound.is_closed()
    }

    async fn send(&self, payload: &str) -> Result<(), ListenerError> {
        if !self.is_open() {
            return Err(ListenerError::Closed);
        }

        self.outbound
            .send(payload.to_string())
            .map_err(|e| ListenerError::Send(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_queues_payload() {
        let (listener, mut rx) = WsListener::new();

        listener.send("hello").await.unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn closed_listener_rejects_sends() {
        let (listener, _rx) = WsListener::new();
        listener.close();

        assert!(!listener.is_open());
        assert!(matches!(
            listener.send("x").await,
            Err(ListenerError::Closed)
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_closes_listener() {
        let (listener, rx) = WsListener::new();
        drop(rx);

        assert!(!listener.is_open());
    }
}
