//! Title document handlers.
//!
//! Every successful write that changes the collection is followed by a
//! snapshot broadcast to connected WebSocket clients.

use reelrack_engine::{CatalogRecord, NewRecord, RecordPatch, WriteOutcome};

use crate::error::{AppError, Result};
use crate::websocket::ServerMessage;
use crate::AppState;

/// All titles, newest creation first.
pub async fn list_titles(state: &AppState) -> Result<Vec<CatalogRecord>> {
    state.titles.list().await
}

pub async fn get_title(state: &AppState, id: &str) -> Result<CatalogRecord> {
    state
        .titles
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("title {id}")))
}

/// Create a document under the client-chosen id.
pub async fn create_title(state: &AppState, record: NewRecord) -> Result<CatalogRecord> {
    if record.id.trim().is_empty() {
        return Err(AppError::BadRequest("title id is required".to_string()));
    }

    let created = state.titles.create(record).await?;
    tracing::info!(record_id = %created.id, title = %created.fields.title, "title created");
    publish_snapshot(state).await;
    Ok(created)
}

/// Merge a patch into a document, creating it when absent and complete.
pub async fn merge_title(
    state: &AppState,
    id: &str,
    patch: RecordPatch,
) -> Result<(CatalogRecord, WriteOutcome)> {
    let (record, outcome) = state.titles.merge(id, patch).await?;
    tracing::info!(record_id = %id, ?outcome, "title merged");
    publish_snapshot(state).await;
    Ok((record, outcome))
}

pub async fn delete_title(state: &AppState, id: &str) -> Result<WriteOutcome> {
    let outcome = state.titles.delete(id).await?;
    tracing::info!(record_id = %id, ?outcome, "title delete");
    if outcome.changed() {
        publish_snapshot(state).await;
    }
    Ok(outcome)
}

/// Push the current collection to every WebSocket client.
///
/// Loading and broadcasting happen under the publish lock, so a later
/// broadcast never carries an older collection than an earlier one.
async fn publish_snapshot(state: &AppState) {
    if state.conn_manager.connection_count() == 0 {
        return;
    }
    let _publishing = state.publish_lock.lock().await;
    match state.titles.list().await {
        Ok(records) => {
            let sent = state
                .conn_manager
                .broadcast_all(ServerMessage::snapshot(records));
            tracing::debug!(sent_to = sent, "snapshot published");
        }
        Err(e) => tracing::warn!(error = %e, "failed to load snapshot for broadcast"),
    }
}
