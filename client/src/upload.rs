//! Binary asset uploads.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use reelrack_engine::{asset, AssetKind};
use std::fmt;

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBlob {
    pub file_name: String,
    /// Media type; guessed from the file name when absent
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl AssetBlob {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| asset::content_type_for(&self.file_name))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Destination of an asset in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath {
    kind: AssetKind,
    path: String,
}

impl AssetPath {
    /// `posters/{id}-{file}` or `trailers/{id}-{file}`.
    pub fn new(kind: AssetKind, record_id: &str, file_name: &str) -> Self {
        Self {
            kind,
            path: asset::asset_path(kind, record_id, file_name),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Durable URL an uploaded asset can be fetched from.
pub type RetrievalUrl = String;

/// Receives upload progress as a whole percentage.
pub type ProgressFn<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Stores blobs and hands back their retrieval URLs.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Upload `blob` to `path`.
    ///
    /// Resolves once the object is durably stored. `progress` sees
    /// non-decreasing percentages and always sees 100 on success.
    async fn upload(
        &self,
        blob: &AssetBlob,
        path: &AssetPath,
        progress: &ProgressFn<'_>,
    ) -> Result<RetrievalUrl, TransportError>;
}

/// `round(transferred * 100 / total)`, clamped to 100. An empty blob is done.
pub fn progress_percent(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let transferred = u128::from(transferred.min(total));
    let total = u128::from(total);
    ((transferred * 100 + total / 2) / total) as u8
}

/// Turns byte counts into a monotonic percentage stream.
pub struct ProgressTracker<'a> {
    sink: &'a ProgressFn<'a>,
    total: u64,
    last: Option<u8>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a ProgressFn<'a>, total: u64) -> Self {
        Self {
            sink,
            total,
            last: None,
        }
    }

    /// Report the bytes committed so far. Repeated or lower values are dropped.
    pub fn report(&mut self, transferred: u64) {
        let percent = progress_percent(transferred, self.total);
        if self.last.map_or(true, |last| percent > last) {
            self.last = Some(percent);
            (self.sink)(percent);
        }
    }

    /// Report completion.
    pub fn finish(&mut self) {
        self.report(self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn percent_rounds() {
        assert_eq!(progress_percent(0, 200), 0);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(10, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn tracker_is_monotonic_and_finishes() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        let mut tracker = ProgressTracker::new(&sink, 1000);

        tracker.report(0);
        tracker.report(500);
        tracker.report(400);
        tracker.report(500);
        tracker.report(1000);
        tracker.finish();

        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
    }

    #[test]
    fn sink_may_borrow_local_state() {
        let total = Mutex::new(0u32);
        let sink: &ProgressFn<'_> = &|p: u8| *total.lock().unwrap() += u32::from(p);
        let mut tracker = ProgressTracker::new(sink, 4);
        tracker.report(1);
        tracker.finish();
        assert_eq!(*total.lock().unwrap(), 25 + 100);
    }

    #[test]
    fn tracker_on_empty_blob() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);
        ProgressTracker::new(&sink, 0).finish();
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn blob_content_type_falls_back_to_extension() {
        let blob = AssetBlob::new("poster.png", vec![1, 2, 3]);
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(blob.len(), 3);

        let blob = blob.with_content_type("image/x-custom");
        assert_eq!(blob.content_type(), "image/x-custom");
    }

    #[test]
    fn asset_paths() {
        let path = AssetPath::new(AssetKind::Trailer, "t-1", "clips/teaser.mp4");
        assert_eq!(path.as_str(), "trailers/t-1-teaser.mp4");
        assert_eq!(path.kind(), AssetKind::Trailer);
    }
}
