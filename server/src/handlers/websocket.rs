//! WebSocket handler for snapshot push.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::websocket::{ClientMessage, ServerMessage};
use crate::AppState;

/// Handle an established WebSocket connection.
///
/// The connection is registered with the manager, receives an initial
/// snapshot, and then answers client messages until it closes.
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState, client: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_manager = state.conn_manager.clone();
    let conn_id = conn_manager.register(client.clone(), tx);

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    send_snapshot(&state, &conn_id).await;

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    conn_manager.send_to(&conn_id, ServerMessage::Pong);
                }
                Ok(ClientMessage::Refresh) => send_snapshot(&state, &conn_id).await,
                Err(e) => {
                    conn_manager.send_to(
                        &conn_id,
                        ServerMessage::error(format!("Invalid message format: {}", e)),
                    );
                }
            },
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        client = %client,
        active_connections = conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Send the current collection to one connection, ordered with broadcasts.
async fn send_snapshot(state: &AppState, conn_id: &str) {
    let _publishing = state.publish_lock.lock().await;
    let message = match state.titles.list().await {
        Ok(records) => ServerMessage::snapshot(records),
        Err(e) => ServerMessage::error(e.to_string()),
    };
    state.conn_manager.send_to(conn_id, message);
}
