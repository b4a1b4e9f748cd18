//! ReelRack Server binary.

use std::sync::Arc;

use reelrack_server::blobs::spawn_session_sweeper;
use reelrack_server::db::{MemoryTitleStore, PgTitleStore, TitleStore};
use reelrack_server::{build_router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelrack_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting ReelRack Server on {}:{}", config.host, config.port);

    let titles: Arc<dyn TitleStore> = match &config.database_url {
        Some(url) => Arc::new(PgTitleStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, titles are kept in memory");
            Arc::new(MemoryTitleStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.blob_dir).await?;
    tracing::info!(blob_dir = %config.blob_dir.display(), "Serving blobs");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, titles);
    spawn_session_sweeper(state.blobs.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
