//! The remote document store seam.

use crate::error::TransportError;
use async_trait::async_trait;
use reelrack_engine::{CatalogRecord, NewRecord, RecordPatch, WriteOutcome};

/// A record as written by the store, with what the write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record: CatalogRecord,
    pub outcome: WriteOutcome,
}

/// Document operations on the catalog collection.
///
/// Timestamps are assigned by the store. A merge never clears fields the
/// patch leaves out.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The whole collection, newest creation first.
    async fn list(&self) -> Result<Vec<CatalogRecord>, TransportError>;

    /// One record, `None` if absent.
    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>, TransportError>;

    /// Create a complete document under a new id.
    async fn create(&self, record: NewRecord) -> Result<CatalogRecord, TransportError>;

    /// Merge-update a document, creating it if absent and the patch is complete.
    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<StoredRecord, TransportError>;

    /// Delete a document. Deleting an absent id succeeds.
    async fn delete(&self, id: &str) -> Result<(), TransportError>;
}
