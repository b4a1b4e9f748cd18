//! Title document persistence.
//!
//! Handlers talk to a [`TitleStore`]. [`PgTitleStore`] keeps titles in
//! PostgreSQL; [`MemoryTitleStore`] keeps them in the engine's in-memory
//! collection when no database is configured.

mod memory;
mod titles;

pub use memory::MemoryTitleStore;
pub use titles::PgTitleStore;

use crate::error::Result;
use async_trait::async_trait;
use reelrack_engine::{CatalogRecord, NewRecord, RecordPatch, Timestamp, WriteOutcome};

/// Storage backend for the `titles` collection.
#[async_trait]
pub trait TitleStore: Send + Sync {
    /// Short name of the backend, reported by the health check.
    fn backend(&self) -> &'static str;

    /// All titles, newest creation first.
    async fn list(&self) -> Result<Vec<CatalogRecord>>;

    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>>;

    /// Insert a complete document; fails with `RecordAlreadyExists` if the id is taken.
    async fn create(&self, record: NewRecord) -> Result<CatalogRecord>;

    /// Merge a patch, creating the document when absent and the patch is complete.
    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<(CatalogRecord, WriteOutcome)>;

    /// Remove a document. Absent ids report `Unchanged`.
    async fn delete(&self, id: &str) -> Result<WriteOutcome>;
}

/// Current server time in milliseconds.
pub(crate) fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}
