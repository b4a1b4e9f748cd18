//! Upload session and blob retrieval routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::blobs::UploadStatus;
use crate::error::{AppError, Result};
use crate::AppState;

/// Header carrying the byte offset a chunk starts at.
pub const UPLOAD_OFFSET_HEADER: &str = "upload-offset";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenUpload {
    path: String,
    #[serde(default)]
    content_type: Option<String>,
    total_bytes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadOpened {
    upload_id: String,
}

#[derive(Debug, Serialize)]
struct UploadCompleted {
    url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(open_handler))
        .route("/uploads/{id}", get(status_handler).put(chunk_handler))
        .route("/uploads/{id}/complete", post(complete_handler))
        .route("/blobs/{*path}", get(blob_handler))
}

/// POST /uploads - open a session.
async fn open_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<OpenUpload>,
) -> Result<(StatusCode, Json<UploadOpened>)> {
    let upload_id = state
        .blobs
        .open(&request.path, request.content_type, request.total_bytes)?;
    Ok((StatusCode::CREATED, Json(UploadOpened { upload_id })))
}

/// PUT /uploads/{id} - append a chunk at `Upload-Offset`.
async fn chunk_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadStatus>> {
    let offset = headers
        .get(UPLOAD_OFFSET_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::BadRequest("missing or invalid Upload-Offset header".into()))?;

    Ok(Json(state.blobs.append(&id, offset, body)?))
}

/// GET /uploads/{id} - committed offset, for resuming.
async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UploadStatus>> {
    Ok(Json(state.blobs.status(&id)?))
}

/// POST /uploads/{id}/complete
async fn complete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UploadCompleted>> {
    let url = state.blobs.complete(&id).await?;
    Ok(Json(UploadCompleted { url }))
}

/// GET /blobs/{*path} - stored object bytes.
async fn blob_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse> {
    let (bytes, content_type) = state.blobs.read(&path).await?;
    Ok(([(CONTENT_TYPE, content_type)], bytes))
}
