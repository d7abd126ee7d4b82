//! Websocket endpoint
//!
//! Each connection joins the broadcaster as a listener, receives the cached
//! aggregate right away, and gets the cached aggregate back for any text
//! message it sends. Closing the socket leaves the broadcaster.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::adapters::WsListener;
use crate::app::{render_payload, ResultCache};
use crate::domain::ports::{KeyValueStore, Listener};
use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Payload for the cached aggregate, if one has been published
pub async fn cached_payload<S>(cache: &ResultCache<S>) -> Option<String>
where
    S: KeyValueStore + ?Sized,
{
    let cached = cache.latest().await?;
    match render_payload(&cached.metrics) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(error = %e, "Unable to serialize cached metrics");
            None
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (listener, mut outbound) = WsListener::new();
    let listener = Arc::new(listener);
    let id = listener.id();

    let registered: Arc<dyn Listener> = listener.clone();
    state.broadcaster.on_listener_join(&registered);

    if let Some(payload) = cached_payload(&state.cache).await {
        if socket.send(Message::Text(payload)).await.is_err() {
            listener.close();
            state.broadcaster.on_listener_leave(id);
            return;
        }
    }

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(payload) = outgoing else { break };
                if let Err(e) = socket.send(Message::Text(payload)).await {
                    tracing::debug!(listener = %id, error = %e, "Websocket send failed");
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(_))) => {
                    let Some(payload) = cached_payload(&state.cache).await else {
                        continue;
                    };
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(listener = %id, error = %e, "Websocket receive failed");
                    break;
                }
            },
        }
    }

    listener.close();
    state.broadcaster.on_listener_leave(id);
}
