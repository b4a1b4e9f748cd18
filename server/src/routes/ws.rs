//! WebSocket upgrade route.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::handlers::handle_websocket_connection;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct WsParams {
    /// Free-form client label used in logs
    client: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// GET /ws - subscribe to catalog snapshots.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Response {
    let client = params.client.unwrap_or_else(|| "anonymous".to_string());
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state, client))
}
