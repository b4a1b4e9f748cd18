//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `postgres` or `memory`
    pub store: &'static str,
    pub titles: usize,
    pub ws_connections: usize,
    pub upload_sessions: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// GET /health - liveness plus a summary of the catalog and its subscribers.
///
/// A failing title store reports `degraded` rather than an error status.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, titles) = match state.titles.list().await {
        Ok(records) => ("ok", records.len()),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not list titles");
            ("degraded", 0)
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store: state.titles.backend(),
        titles,
        ws_connections: state.conn_manager.connection_count(),
        upload_sessions: state.blobs.session_count(),
    })
}

async fn root() -> &'static str {
    "ReelRack Catalog Server"
}
