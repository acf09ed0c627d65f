//! WebSocket push channel for task progress.
//!
//! Each connection subscribes to one task. Events are forwarded as JSON text
//! frames; the server pings at the hub's heartbeat interval. A close, a
//! receive error or a failed send releases the subscription.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use sieve_core::ChannelTransport;

use super::handlers::error_response;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket upgrade handler.
///
/// Only ids the orchestrator knows about (running or finished) get a
/// channel in the hub.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(task_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !state.orchestrator().is_known(&task_id).await {
        debug!("Refusing WebSocket for unknown task {}", task_id);
        return error_response(StatusCode::NOT_FOUND, "Task not found").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, task_id, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, task_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let hub = Arc::clone(state.hub());
    let (transport, mut rx) = ChannelTransport::channel(hub.config().transport_buffer);
    let heartbeat = Duration::from_secs(hub.config().heartbeat_interval_secs);

    // Track connection metrics
    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected for task {}", task_id);

    // The forwarding task must be draining before the replay starts.
    let mut send_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(text) = frame else {
                        break;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                    WS_MESSAGES_SENT.with_label_values(&["event"]).inc();
                }
                _ = ticker.tick() => {
                    if sender.send(Message::Ping(Default::default())).await.is_err() {
                        debug!("WebSocket heartbeat failed, client disconnected");
                        break;
                    }
                    WS_MESSAGES_SENT.with_label_values(&["ping"]).inc();
                }
            }
        }
    });

    let subscription = match hub.subscribe(&task_id, Arc::new(transport)).await {
        Ok(subscription) => subscription,
        Err(e) => {
            // Dropping both halves closes the connection; the client can
            // reconnect for the events still queued.
            warn!("Replay to task {} failed, closing socket: {}", task_id, e);
            send_task.abort();
            WS_CONNECTIONS_ACTIVE.dec();
            return;
        }
    };

    // Handle incoming messages from client (pong, close)
    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client closed connection");
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    // We don't expect any client messages, but log them
                    debug!("Received text message: {}", text.as_str());
                }
                Some(Ok(_)) => {
                    // Pong and binary frames are ignored
                }
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            },
            _ = &mut send_task => {
                debug!("WebSocket forwarding stopped for task {}", task_id);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    hub.release(&task_id, subscription).await;
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected from task {}", task_id);
}
