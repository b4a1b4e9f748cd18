//! In-memory blob store.

use super::poison_err;
use crate::error::TransportError;
use crate::upload::{AssetBlob, AssetPath, AssetUploader, ProgressFn, ProgressTracker, RetrievalUrl};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    content_type: String,
}

/// Blob store that keeps objects in memory.
///
/// Transfers are split into chunks with a suspension point between them, so
/// concurrent uploads interleave. Uploads under a registered failure prefix
/// fail after the first chunk and store nothing.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    chunk_size: usize,
    latency: Option<Duration>,
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_prefixes: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

/// Decrements the in-flight counter when an upload ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryBlobStore {
    /// Create a store whose URLs start with `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            latency: None,
            objects: Mutex::new(HashMap::new()),
            fail_prefixes: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sleep this long per chunk.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every upload whose path starts with `prefix` fail.
    pub fn fail_uploads_under(&self, prefix: impl Into<String>) {
        if let Ok(mut prefixes) = self.fail_prefixes.lock() {
            prefixes.push(prefix.into());
        }
    }

    /// Bytes stored at `path`.
    pub fn get(&self, path: &str) -> Option<Bytes> {
        let objects = self.objects.lock().ok()?;
        objects.get(path).map(|object| object.bytes.clone())
    }

    /// Media type recorded for `path`.
    pub fn content_type(&self, path: &str) -> Option<String> {
        let objects = self.objects.lock().ok()?;
        objects.get(path).map(|object| object.content_type.clone())
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    /// Number of uploads that completed.
    pub fn upload_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Highest number of uploads observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn url_for(&self, path: &str) -> RetrievalUrl {
        format!("{}/{}", self.base_url, path)
    }

    fn should_fail(&self, path: &str) -> Result<bool, TransportError> {
        let prefixes = self.fail_prefixes.lock().map_err(poison_err)?;
        Ok(prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())))
    }

    async fn pause(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }
}

#[async_trait]
impl AssetUploader for MemoryBlobStore {
    async fn upload(
        &self,
        blob: &AssetBlob,
        path: &AssetPath,
        progress: &ProgressFn<'_>,
    ) -> Result<RetrievalUrl, TransportError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let total = blob.len();
        let mut tracker = ProgressTracker::new(progress, total);
        tracker.report(0);

        let mut sent = 0u64;
        for chunk in blob.bytes.chunks(self.chunk_size) {
            self.pause().await;
            if self.should_fail(path.as_str())? {
                tracing::warn!(path = %path, sent, "injected upload failure");
                return Err(TransportError::Storage(format!(
                    "upload to {path} failed after {sent} bytes"
                )));
            }
            sent += chunk.len() as u64;
            tracker.report(sent);
        }
        if blob.is_empty() {
            self.pause().await;
            if self.should_fail(path.as_str())? {
                return Err(TransportError::Storage(format!("upload to {path} failed")));
            }
        }

        self.objects.lock().map_err(poison_err)?.insert(
            path.as_str().to_string(),
            StoredObject {
                bytes: blob.bytes.clone(),
                content_type: blob.content_type().to_string(),
            },
        );
        self.completed.fetch_add(1, Ordering::SeqCst);
        tracker.finish();

        tracing::debug!(path = %path, bytes = total, "blob stored");
        Ok(self.url_for(path.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelrack_engine::AssetKind;

    #[tokio::test]
    async fn upload_stores_and_reports_progress() {
        let store = MemoryBlobStore::new("https://cdn.test/").with_chunk_size(4);
        let blob = AssetBlob::new("poster.jpg", vec![0u8; 10]);
        let path = AssetPath::new(AssetKind::Poster, "t-1", "poster.jpg");

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let url = store.upload(&blob, &path, &sink).await.unwrap();

        assert_eq!(url, "https://cdn.test/posters/t-1-poster.jpg");
        assert_eq!(store.get("posters/t-1-poster.jpg").unwrap().len(), 10);
        assert_eq!(
            store.content_type("posters/t-1-poster.jpg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(*seen.lock().unwrap(), vec![0, 40, 80, 100]);
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn injected_failure_stores_nothing() {
        let store = MemoryBlobStore::default();
        store.fail_uploads_under("trailers/");
        let blob = AssetBlob::new("t.mp4", vec![1u8; 8]);
        let path = AssetPath::new(AssetKind::Trailer, "t-1", "t.mp4");

        let result = store.upload(&blob, &path, &|_: u8| {}).await;
        assert!(matches!(result, Err(TransportError::Storage(_))));
        assert_eq!(store.object_count(), 0);
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn empty_blob_completes() {
        let store = MemoryBlobStore::default();
        let blob = AssetBlob::new("empty.png", Vec::new());
        let path = AssetPath::new(AssetKind::Poster, "t-1", "empty.png");

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        store.upload(&blob, &path, &sink).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }
}
