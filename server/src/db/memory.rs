//! In-memory title store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reelrack_engine::{
    ApplyResult, CatalogRecord, CatalogStore, Mutation, NewRecord, RecordPatch, Timestamp,
    WriteOutcome,
};

use super::{now_millis, TitleStore};
use crate::error::{AppError, Result};

/// [`TitleStore`] over the engine's [`CatalogStore`]. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryTitleStore {
    store: Mutex<CatalogStore>,
    last_timestamp: AtomicU64,
}

impl MemoryTitleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        Self {
            store: Mutex::new(CatalogStore::from_records(records)),
            last_timestamp: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogStore>> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("title store lock poisoned".to_string()))
    }

    /// Stamp and apply one write.
    pub fn apply(&self, mutation: Mutation) -> Result<ApplyResult> {
        let timestamp = self.timestamp();
        Ok(self.lock()?.apply(mutation, timestamp)?)
    }

    /// Wall-clock milliseconds, strictly increasing across calls.
    fn timestamp(&self) -> Timestamp {
        let now = now_millis();
        let mut last = self.last_timestamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_timestamp.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

#[async_trait]
impl TitleStore for MemoryTitleStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.lock()?.snapshot())
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn create(&self, record: NewRecord) -> Result<CatalogRecord> {
        let result = self.apply(Mutation::Create(record))?;
        result
            .record
            .ok_or_else(|| AppError::Internal(format!("create of {} returned no document", result.record_id)))
    }

    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<(CatalogRecord, WriteOutcome)> {
        let result = self.apply(Mutation::merge(id, patch))?;
        let record = result
            .record
            .ok_or_else(|| AppError::Internal(format!("merge of {id} returned no document")))?;
        Ok((record, result.outcome))
    }

    async fn delete(&self, id: &str) -> Result<WriteOutcome> {
        Ok(self.apply(Mutation::delete(id))?.outcome)
    }
}
