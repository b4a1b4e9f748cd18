//! Title document routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use reelrack_engine::{CatalogRecord, NewRecord, RecordPatch, WriteOutcome};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{create_title, delete_title, get_title, list_titles, merge_title};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/titles", get(list_handler).post(create_handler))
        .route(
            "/titles/{id}",
            get(get_handler).patch(merge_handler).delete(delete_handler),
        )
}

/// GET /titles - ordered snapshot.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<CatalogRecord>>> {
    Ok(Json(list_titles(&state).await?))
}

/// GET /titles/{id}
async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogRecord>> {
    Ok(Json(get_title(&state, &id).await?))
}

/// POST /titles - create under the client-chosen id.
async fn create_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(record): Json<NewRecord>,
) -> Result<(StatusCode, Json<CatalogRecord>)> {
    let created = create_title(&state, record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /titles/{id} - merge; 201 when the merge created the document.
async fn merge_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<RecordPatch>,
) -> Result<(StatusCode, Json<CatalogRecord>)> {
    let (record, outcome) = merge_title(&state, &id, patch).await?;
    let status = match outcome {
        WriteOutcome::Created => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(record)))
}

/// DELETE /titles/{id} - idempotent.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    delete_title(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
