//! # ReelRack Server
//!
//! Reference remote for the ReelRack catalog: the `titles` document
//! collection over HTTP, snapshot push over WebSocket and resumable chunked
//! uploads for poster and trailer assets.
//!
//! The binary wires [`Config`] into an [`AppState`] and serves
//! [`build_router`]; tests build the same router around a
//! [`db::MemoryTitleStore`].

pub mod auth;
pub mod blobs;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod websocket;

pub use config::{Config, ConfigError};
pub use error::AppError;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::blobs::BlobStore;
use crate::db::TitleStore;
use crate::websocket::ConnectionManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub titles: Arc<dyn TitleStore>,
    pub blobs: Arc<BlobStore>,
    pub config: Arc<Config>,
    pub conn_manager: Arc<ConnectionManager>,
    /// Held from loading a snapshot until it is sent
    pub publish_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, titles: Arc<dyn TitleStore>) -> Self {
        let blobs = BlobStore::new(
            config.blob_dir.clone(),
            config.public_url.clone(),
            config.upload_limits(),
        );
        Self {
            titles,
            blobs: Arc::new(blobs),
            config: Arc::new(config),
            conn_manager: ConnectionManager::new_shared(),
            publish_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// The full application router with tracing and CORS layers applied.
pub fn build_router(state: AppState) -> Router {
    // chunk bodies plus headroom for the JSON routes
    let body_limit = state.config.max_chunk_bytes + 64 * 1024;

    Router::new()
        .merge(routes::create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
