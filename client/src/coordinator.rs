//! Catalog mutations: validation, asset uploads and the single document write.
//!
//! An upsert validates its draft before touching the network, runs the poster
//! and trailer uploads concurrently, and finishes with exactly one document
//! write carrying the uploaded URLs. A failed upload aborts the upsert before
//! anything is written.

use crate::error::{Result, TransportError};
use crate::remote::DocumentStore;
use crate::session::Session;
use crate::upload::{AssetBlob, AssetPath, AssetUploader, RetrievalUrl};
use reelrack_engine::{
    AssetKind, CatalogRecord, NewRecord, RecordDraft, RecordFields, RecordPatch,
    WriteOutcome,
};
use std::sync::Arc;

/// New assets to attach in an upsert.
#[derive(Debug, Clone, Default)]
pub struct AssetUploads {
    pub poster: Option<AssetBlob>,
    pub trailer: Option<AssetBlob>,
}

impl AssetUploads {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_poster(mut self, blob: AssetBlob) -> Self {
        self.poster = Some(blob);
        self
    }

    pub fn with_trailer(mut self, blob: AssetBlob) -> Self {
        self.trailer = Some(blob);
        self
    }
}

/// Receives per-asset upload progress percentages.
pub type UploadProgress = Arc<dyn Fn(AssetKind, u8) + Send + Sync>;

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub record: CatalogRecord,
    /// `Created` or `Updated`
    pub outcome: WriteOutcome,
}

/// Orchestrates create, update and delete against the remote store.
#[derive(Clone)]
pub struct CatalogMutationCoordinator {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<dyn AssetUploader>,
}

impl CatalogMutationCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, uploader: Arc<dyn AssetUploader>) -> Self {
        Self { store, uploader }
    }

    /// Create or update a catalog entry.
    ///
    /// A draft without an id is created under a fresh id; a draft with an id
    /// is merged into the stored document. Asset URLs are only ever replaced
    /// by a new upload or a non-empty draft value, never cleared.
    pub async fn upsert(
        &self,
        session: &Session,
        draft: RecordDraft,
        assets: AssetUploads,
        progress: Option<UploadProgress>,
    ) -> Result<UpsertOutcome> {
        session.require_admin("upsert")?;
        let fields = draft.validate()?;

        let (id, is_new) = match draft.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => (id.to_string(), false),
            _ => (uuid::Uuid::new_v4().to_string(), true),
        };

        let (poster_url, trailer_url) = futures::try_join!(
            self.upload_asset(AssetKind::Poster, &id, assets.poster.as_ref(), progress.as_ref()),
            self.upload_asset(AssetKind::Trailer, &id, assets.trailer.as_ref(), progress.as_ref()),
        )?;

        let created_by = session.uid().map(str::to_string);

        if is_new {
            let fields = RecordFields {
                poster_url: poster_url.unwrap_or(fields.poster_url),
                trailer_url: trailer_url.unwrap_or(fields.trailer_url),
                ..fields
            };
            let record = self
                .store
                .create(NewRecord::new(id, fields, created_by))
                .await?;
            tracing::info!(record_id = %record.id, title = %record.title(), "title created");
            return Ok(UpsertOutcome {
                record,
                outcome: WriteOutcome::Created,
            });
        }

        let patch = merge_patch(fields, poster_url, trailer_url, created_by);
        let stored = self.store.merge(&id, patch).await?;
        tracing::info!(record_id = %id, outcome = ?stored.outcome, "title saved");
        Ok(UpsertOutcome {
            record: stored.record,
            outcome: stored.outcome,
        })
    }

    /// Delete an entry. Deleting an absent id succeeds.
    ///
    /// Uploaded assets are left in blob storage.
    pub async fn remove(&self, session: &Session, id: &str) -> Result<()> {
        session.require_admin("delete")?;
        self.store.delete(id).await?;
        tracing::info!(record_id = %id, "title deleted");
        Ok(())
    }

    async fn upload_asset(
        &self,
        kind: AssetKind,
        id: &str,
        blob: Option<&AssetBlob>,
        progress: Option<&UploadProgress>,
    ) -> std::result::Result<Option<RetrievalUrl>, TransportError> {
        let Some(blob) = blob else {
            return Ok(None);
        };
        let path = AssetPath::new(kind, id, &blob.file_name);
        let report = |percent: u8| {
            if let Some(progress) = progress {
                progress(kind, percent);
            }
        };

        tracing::debug!(path = %path, bytes = blob.len(), "uploading {kind}");
        let url = self.uploader.upload(blob, &path, &report).await?;
        Ok(Some(url))
    }
}

/// Patch for updating an existing id.
///
/// Every catalog field is set; asset URLs only when there is something to set.
fn merge_patch(
    fields: RecordFields,
    poster_url: Option<RetrievalUrl>,
    trailer_url: Option<RetrievalUrl>,
    created_by: Option<String>,
) -> RecordPatch {
    let non_empty = |url: String| (!url.is_empty()).then_some(url);
    RecordPatch {
        title: Some(fields.title),
        kind: Some(fields.kind),
        year: Some(fields.year),
        genres: Some(fields.genres),
        cast_summary: Some(fields.cast_summary),
        description: Some(fields.description),
        poster_url: poster_url.or_else(|| non_empty(fields.poster_url)),
        trailer_url: trailer_url.or_else(|| non_empty(fields.trailer_url)),
        created_by,
    }
}
