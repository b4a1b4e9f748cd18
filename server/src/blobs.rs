//! Blob storage for poster and trailer assets.
//!
//! Uploads are resumable sessions: bytes are appended in order at the
//! committed offset and only become an object once the session completes.
//! Completed objects live under the blob directory at their storage path.
//! Sessions left idle past their TTL are dropped along with their buffers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reelrack_engine::{content_type_for, validate_asset_path};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Characters escaped in a URL path segment; RFC 3986 unreserved ones pass through.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Size and lifetime limits applied to upload sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest chunk accepted by a single append
    pub max_chunk_bytes: usize,
    /// Largest object a session may declare
    pub max_object_bytes: u64,
    /// Idle time after which a session is discarded
    pub session_ttl: Duration,
}

/// Progress of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatus {
    pub committed: u64,
    pub total: u64,
}

#[derive(Debug)]
struct UploadSession {
    path: String,
    content_type: String,
    total: u64,
    buffer: Vec<u8>,
    touched: Instant,
}

impl UploadSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.touched.elapsed() >= ttl
    }

    fn status(&self) -> UploadStatus {
        UploadStatus {
            committed: self.buffer.len() as u64,
            total: self.total,
        }
    }
}

/// Upload sessions plus the directory completed objects are written to.
#[derive(Debug)]
pub struct BlobStore {
    dir: PathBuf,
    public_url: String,
    limits: UploadLimits,
    sessions: DashMap<String, UploadSession>,
    content_types: DashMap<String, String>,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>, public_url: impl Into<String>, limits: UploadLimits) -> Self {
        Self {
            dir: dir.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            limits,
            sessions: DashMap::new(),
            content_types: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Number of sessions not yet completed or swept.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Retrieval URL of an object.
    pub fn url_for(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        format!("{}/blobs/{}", self.public_url, encoded.join("/"))
    }

    /// Open a session for an object of `total` bytes. Returns the upload id.
    pub fn open(&self, path: &str, content_type: Option<String>, total: u64) -> Result<String> {
        validate_asset_path(path)?;
        if total > self.limits.max_object_bytes {
            return Err(AppError::BadRequest(format!(
                "object of {total} bytes exceeds the {} byte limit",
                self.limits.max_object_bytes
            )));
        }
        self.sweep_expired();

        let content_type = content_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| content_type_for(path).to_string());

        let upload_id = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(
            upload_id.clone(),
            UploadSession {
                path: path.to_string(),
                content_type,
                total,
                buffer: Vec::new(),
                touched: Instant::now(),
            },
        );

        tracing::info!(upload_id = %upload_id, path = %path, total, "upload session opened");
        Ok(upload_id)
    }

    /// Append a chunk starting at `offset`, which must equal the committed size.
    pub fn append(&self, upload_id: &str, offset: u64, chunk: Bytes) -> Result<UploadStatus> {
        if chunk.len() > self.limits.max_chunk_bytes {
            return Err(AppError::BadRequest(format!(
                "chunk of {} bytes exceeds the {} byte limit",
                chunk.len(),
                self.limits.max_chunk_bytes
            )));
        }

        let mut session = self.live_session(upload_id)?;

        let committed = session.buffer.len() as u64;
        if offset != committed {
            return Err(AppError::Conflict(format!(
                "upload {upload_id} is at offset {committed}, chunk starts at {offset}"
            )));
        }
        if committed + chunk.len() as u64 > session.total {
            return Err(AppError::BadRequest(format!(
                "chunk overruns the declared size of {} bytes",
                session.total
            )));
        }

        session.buffer.extend_from_slice(&chunk);
        session.touched = Instant::now();
        tracing::debug!(upload_id, committed = session.buffer.len(), "chunk committed");
        Ok(session.status())
    }

    pub fn status(&self, upload_id: &str) -> Result<UploadStatus> {
        self.live_session(upload_id).map(|session| session.status())
    }

    /// Drop sessions idle past the TTL. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let ttl = self.limits.session_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|upload_id, session| {
            let expired = session.is_expired(ttl);
            if expired {
                tracing::info!(upload_id = %upload_id, path = %session.path, committed = session.buffer.len(), "upload session expired");
            }
            !expired
        });
        before.saturating_sub(self.sessions.len())
    }

    fn live_session(&self, upload_id: &str) -> Result<RefMut<'_, String, UploadSession>> {
        let session = self
            .sessions
            .get_mut(upload_id)
            .ok_or_else(|| unknown_upload(upload_id))?;
        if session.is_expired(self.limits.session_ttl) {
            drop(session);
            self.sessions.remove(upload_id);
            return Err(unknown_upload(upload_id));
        }
        Ok(session)
    }

    /// Write a fully committed session to disk and return the object's URL.
    pub async fn complete(&self, upload_id: &str) -> Result<String> {
        let status = self.status(upload_id)?;
        if status.committed != status.total {
            return Err(AppError::Conflict(format!(
                "upload {upload_id} has {} of {} bytes",
                status.committed, status.total
            )));
        }

        let (_, session) = self
            .sessions
            .remove(upload_id)
            .ok_or_else(|| unknown_upload(upload_id))?;

        let target = self.dir.join(&session.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // write beside the target, then move into place
        let partial = target.with_extension(format!("part-{upload_id}"));
        tokio::fs::write(&partial, &session.buffer).await?;
        tokio::fs::rename(&partial, &target).await?;

        self.content_types
            .insert(session.path.clone(), session.content_type);
        tracing::info!(upload_id, path = %session.path, bytes = session.buffer.len(), "upload completed");
        Ok(self.url_for(&session.path))
    }

    /// Bytes and media type of a stored object.
    pub async fn read(&self, path: &str) -> Result<(Vec<u8>, String)> {
        validate_asset_path(path)?;
        let bytes = match tokio::fs::read(self.dir.join(path)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("blob {path}")))
            }
            Err(e) => return Err(e.into()),
        };
        let content_type = self
            .content_types
            .get(path)
            .map(|t| t.value().clone())
            .unwrap_or_else(|| content_type_for(path).to_string());
        Ok((bytes, content_type))
    }
}

fn unknown_upload(upload_id: &str) -> AppError {
    AppError::NotFound(format!("upload {upload_id}"))
}

/// Periodically drop expired upload sessions.
pub fn spawn_session_sweeper(blobs: Arc<BlobStore>) -> tokio::task::JoinHandle<()> {
    let period = (blobs.limits.session_ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.tick().await;
        loop {
            timer.tick().await;
            let dropped = blobs.sweep_expired();
            if dropped > 0 {
                tracing::info!(dropped, remaining = blobs.session_count(), "upload sessions swept");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> UploadLimits {
        UploadLimits {
            max_chunk_bytes: 4,
            max_object_bytes: 64,
            session_ttl: Duration::from_secs(3600),
        }
    }

    fn store(dir: &Path) -> BlobStore {
        BlobStore::new(dir, "http://media.test/", limits())
    }

    #[tokio::test]
    async fn chunks_then_complete() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());

        let id = blobs.open("posters/t-1-dune.jpg", None, 6).unwrap();
        assert_eq!(
            blobs.append(&id, 0, Bytes::from_static(b"abcd")).unwrap(),
            UploadStatus {
                committed: 4,
                total: 6
            }
        );
        blobs.append(&id, 4, Bytes::from_static(b"ef")).unwrap();

        let url = blobs.complete(&id).await.unwrap();
        assert_eq!(url, "http://media.test/blobs/posters/t-1-dune.jpg");

        let (bytes, content_type) = blobs.read("posters/t-1-dune.jpg").await.unwrap();
        assert_eq!(bytes, b"abcdef");
        assert_eq!(content_type, "image/jpeg");
        assert!(matches!(blobs.status(&id), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn offsets_must_match_committed_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        let id = blobs.open("trailers/t-1-a.mp4", Some("video/mp4".into()), 8).unwrap();

        blobs.append(&id, 0, Bytes::from_static(b"abcd")).unwrap();
        assert!(matches!(
            blobs.append(&id, 0, Bytes::from_static(b"abcd")),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            blobs.append(&id, 4, Bytes::from_static(b"too long")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(blobs.complete(&id).await, Err(AppError::Conflict(_))));
        assert_eq!(blobs.status(&id).unwrap().committed, 4);
    }

    #[test]
    fn rejects_paths_outside_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        for path in ["../etc/passwd", "posters/../x", "other/a.jpg", "posters/"] {
            assert!(
                matches!(blobs.open(path, None, 1), Err(AppError::Engine(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn urls_escape_segments() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        assert_eq!(
            blobs.url_for("posters/t-1-my poster.jpg"),
            "http://media.test/blobs/posters/t-1-my%20poster.jpg"
        );
        assert_eq!(
            blobs.url_for("trailers/t-2-résumé#1~v2.mp4"),
            "http://media.test/blobs/trailers/t-2-r%C3%A9sum%C3%A9%231~v2.mp4"
        );
    }

    #[test]
    fn declared_size_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        assert!(matches!(
            blobs.open("posters/t-1-big.jpg", None, 65),
            Err(AppError::BadRequest(_))
        ));
        assert!(blobs.open("posters/t-1-big.jpg", None, 64).is_ok());
    }

    #[test]
    fn idle_sessions_expire() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(
            dir.path(),
            "http://media.test",
            UploadLimits {
                session_ttl: Duration::ZERO,
                ..limits()
            },
        );

        let first = blobs.open("posters/t-1-a.jpg", None, 4).unwrap();
        assert_eq!(blobs.sweep_expired(), 1);
        assert_eq!(blobs.session_count(), 0);
        assert!(matches!(blobs.status(&first), Err(AppError::NotFound(_))));

        let second = blobs.open("posters/t-1-b.jpg", None, 4).unwrap();
        assert!(matches!(
            blobs.append(&second, 0, Bytes::from_static(b"ab")),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(blobs.session_count(), 0);
    }

    #[test]
    fn active_sessions_survive_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        let id = blobs.open("posters/t-1-a.jpg", None, 4).unwrap();
        blobs.append(&id, 0, Bytes::from_static(b"ab")).unwrap();

        assert_eq!(blobs.sweep_expired(), 0);
        assert_eq!(blobs.status(&id).unwrap().committed, 2);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());
        assert!(matches!(
            blobs.read("posters/none.jpg").await,
            Err(AppError::NotFound(_))
        ));
    }
}
