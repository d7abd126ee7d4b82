//! Broadcaster
//!
//! Fans every scheduler completion event out to the registered listeners.
//! The registry holds weak references: the transport owns its connection and
//! a dropped connection simply stops receiving.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::app::JobCompleted;
use crate::domain::entities::MetricsSnapshot;
use crate::domain::ports::{Listener, ListenerId};

/// Wire envelope for every payload sent to listeners
#[derive(Debug, Serialize)]
pub struct BroadcastPayload<'a> {
    pub message: &'a MetricsSnapshot,
}

/// Render a snapshot the way listeners receive it
pub fn render_payload(snapshot: &MetricsSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(&BroadcastPayload { message: snapshot })
}

/// Outcome of delivering one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct Broadcaster {
    listeners: RwLock<HashMap<ListenerId, Weak<dyn Listener>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_listener_join(&self, listener: &Arc<dyn Listener>) {
        let id = listener.id();
        self.write_listeners().insert(id, Arc::downgrade(listener));
        tracing::info!(listener = %id, listeners = self.listener_count(), "Listener joined");
    }

    pub fn on_listener_leave(&self, id: ListenerId) {
        let removed = self.write_listeners().remove(&id).is_some();
        if removed {
            tracing::info!(listener = %id, listeners = self.listener_count(), "Listener left");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Send the snapshot to every open listener.
    ///
    /// Closed or dropped listeners are skipped and failed sends are logged;
    /// neither removes the listener from the registry.
    pub async fn deliver(&self, snapshot: &MetricsSnapshot) -> DeliveryReport {
        let payload = match render_payload(snapshot) {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                tracing::error!(error = %e, "Unable to serialize broadcast payload");
                return DeliveryReport::default();
            }
        };

        let registered: Vec<(ListenerId, Weak<dyn Listener>)> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();

        let mut report = DeliveryReport::default();
        let mut sends = JoinSet::new();

        for (id, listener) in registered {
            let Some(listener) = listener.upgrade().filter(|l| l.is_open()) else {
                tracing::debug!(listener = %id, "Skipping closed listener");
                report.skipped += 1;
                continue;
            };

            let payload = payload.clone();
            sends.spawn(async move { (id, listener.send(&payload).await) });
        }

        while let Some(result) = sends.join_next().await {
            match result {
                Ok((_, Ok(()))) => report.delivered += 1,
                Ok((id, Err(e))) => {
                    tracing::warn!(listener = %id, error = %e, "Broadcast send failed");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Broadcast send task failed");
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Broadcast complete"
        );

        report
    }

    /// Deliver every completion event until cancelled or the scheduler is gone
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<JobCompleted>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        tracing::debug!(job = %event.job, "Broadcasting job result");
                        self.deliver(&event.snapshot).await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Broadcaster fell behind, skipped events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        tracing::info!("Broadcaster stopped");
    }

    /// Spawn `run` as a background task
    pub fn spawn(
        self: &Arc<Self>,
        events: broadcast::Receiver<JobCompleted>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(events, cancel))
    }

    fn write_listeners(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<ListenerId, Weak<dyn Listener>>> {
        self.listeners.write().unwrap_or_else(|e| e.into_inner())
    }
}
