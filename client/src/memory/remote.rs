//! In-memory document store with push notifications.

use super::poison_err;
use crate::error::TransportError;
use crate::mirror::{ErrorCallback, RecordList, RemoteCollectionMirror, SnapshotCallback, Subscription};
use crate::remote::{DocumentStore, StoredRecord};
use async_trait::async_trait;
use reelrack_engine::{
    ApplyResult, CatalogRecord, CatalogStore, Error as EngineError, Mutation, NewRecord,
    RecordId, RecordPatch, Timestamp,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// A call made against a [`MemoryRemote`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List,
    Get(RecordId),
    Create(RecordId),
    Merge(RecordId),
    Delete(RecordId),
}

impl RemoteCall {
    /// Whether the call writes.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            RemoteCall::Create(_) | RemoteCall::Merge(_) | RemoteCall::Delete(_)
        )
    }
}

impl From<&Mutation> for RemoteCall {
    fn from(mutation: &Mutation) -> Self {
        match mutation {
            Mutation::Create(record) => RemoteCall::Create(record.id.clone()),
            Mutation::Merge { id, .. } => RemoteCall::Merge(id.clone()),
            Mutation::Delete { id } => RemoteCall::Delete(id.clone()),
        }
    }
}

#[derive(Debug, Clone)]
enum Feed {
    Snapshot(RecordList),
    Failed(TransportError),
}

#[derive(Debug)]
struct Shared {
    store: Mutex<CatalogStore>,
    feed: watch::Sender<Feed>,
    calls: Mutex<Vec<RemoteCall>>,
    revoked: Mutex<Option<String>>,
    clock: AtomicU64,
}

/// In-memory remote catalog.
///
/// Implements both [`DocumentStore`] and [`RemoteCollectionMirror`]; every
/// successful write pushes a fresh snapshot to all subscribers.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    shared: Arc<Shared>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Create an empty remote.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a remote holding a snapshot (newest first).
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        let store = CatalogStore::from_records(records);
        let (feed, _) = watch::channel(Feed::Snapshot(store.snapshot().into()));
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(store),
                feed,
                calls: Mutex::new(Vec::new()),
                revoked: Mutex::new(None),
                clock: AtomicU64::new(0),
            }),
        }
    }

    /// Current collection, newest creation first.
    pub fn snapshot(&self) -> Vec<CatalogRecord> {
        match self.shared.store.lock() {
            Ok(store) => store.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        }
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        match self.shared.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Only the writes received so far.
    pub fn writes(&self) -> Vec<RemoteCall> {
        self.calls().into_iter().filter(RemoteCall::is_write).collect()
    }

    /// Simulate losing read and write access.
    ///
    /// Live subscriptions receive a `PermissionDenied` error and end; later
    /// calls fail the same way.
    pub fn revoke_access(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if let Ok(mut revoked) = self.shared.revoked.lock() {
            *revoked = Some(reason.clone());
        }
        tracing::warn!(reason = %reason, "memory remote access revoked");
        self.shared
            .feed
            .send_replace(Feed::Failed(TransportError::PermissionDenied(reason)));
    }

    fn record_call(&self, call: RemoteCall) -> Result<(), TransportError> {
        self.shared.calls.lock().map_err(poison_err)?.push(call);
        match self.shared.revoked.lock().map_err(poison_err)?.as_ref() {
            Some(reason) => Err(TransportError::PermissionDenied(reason.clone())),
            None => Ok(()),
        }
    }

    /// Millisecond wall clock, strictly increasing across writes.
    fn now(&self) -> Timestamp {
        let wall = chrono::Utc::now().timestamp_millis().max(0) as Timestamp;
        let previous = self
            .shared
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        wall.max(previous + 1)
    }

    /// Apply one write, publishing a snapshot when the collection changed.
    pub fn apply(&self, mutation: Mutation) -> Result<ApplyResult, TransportError> {
        self.record_call(RemoteCall::from(&mutation))?;
        let timestamp = self.now();
        let mut store = self.shared.store.lock().map_err(poison_err)?;
        let result = store.apply(mutation, timestamp).map_err(rejected)?;
        if result.outcome.changed() {
            self.publish(&store);
        }
        Ok(result)
    }

    fn publish(&self, store: &CatalogStore) {
        let snapshot: RecordList = store.snapshot().into();
        tracing::debug!(records = snapshot.len(), "memory remote snapshot published");
        self.shared.feed.send_replace(Feed::Snapshot(snapshot));
    }
}

fn rejected(e: EngineError) -> TransportError {
    match e {
        EngineError::RecordAlreadyExists(id) => TransportError::Conflict(id),
        EngineError::RecordNotFound(id) => TransportError::NotFound(id),
        other => TransportError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MemoryRemote {
    async fn list(&self) -> Result<Vec<CatalogRecord>, TransportError> {
        self.record_call(RemoteCall::List)?;
        Ok(self.shared.store.lock().map_err(poison_err)?.snapshot())
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>, TransportError> {
        self.record_call(RemoteCall::Get(id.to_string()))?;
        Ok(self.shared.store.lock().map_err(poison_err)?.get(id).cloned())
    }

    async fn create(&self, record: NewRecord) -> Result<CatalogRecord, TransportError> {
        self.apply(Mutation::Create(record))?
            .record
            .ok_or_else(|| TransportError::Storage("create returned no document".to_string()))
    }

    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<StoredRecord, TransportError> {
        let result = self.apply(Mutation::merge(id, patch))?;
        let record = result
            .record
            .ok_or_else(|| TransportError::Storage("merge returned no document".to_string()))?;
        Ok(StoredRecord {
            record,
            outcome: result.outcome,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), TransportError> {
        self.apply(Mutation::delete(id))?;
        Ok(())
    }
}

impl RemoteCollectionMirror for MemoryRemote {
    fn subscribe(&self, on_change: SnapshotCallback, on_error: ErrorCallback) -> Subscription {
        let mut feed = self.shared.feed.subscribe();
        Subscription::spawn(async move {
            loop {
                let current = feed.borrow_and_update().clone();
                match current {
                    Feed::Snapshot(records) => on_change(records),
                    Feed::Failed(e) => {
                        on_error(e);
                        return;
                    }
                }
                if feed.changed().await.is_err() {
                    return;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelrack_engine::{Kind, RecordFields, WriteOutcome};

    fn new_record(id: &str, title: &str) -> NewRecord {
        NewRecord::new(id, RecordFields::new(title, Kind::Movie, 2000), Some("admin".into()))
    }

    #[tokio::test]
    async fn writes_are_logged_and_timestamped() {
        let remote = MemoryRemote::new();
        let first = remote.create(new_record("a", "A")).await.unwrap();
        let second = remote.create(new_record("b", "B")).await.unwrap();
        assert!(second.created_at > first.created_at);

        remote.delete("missing").await.unwrap();
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Create("a".into()),
                RemoteCall::Create("b".into()),
                RemoteCall::Delete("missing".into()),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let remote = MemoryRemote::new();
        remote.create(new_record("a", "A")).await.unwrap();
        let err = remote.create(new_record("a", "Again")).await.unwrap_err();
        assert_eq!(err, TransportError::Conflict("a".into()));
    }

    #[tokio::test]
    async fn merge_reports_creation() {
        let remote = MemoryRemote::new();
        let patch = RecordFields::new("Heat", Kind::Movie, 1995).into_patch();
        let stored = remote.merge("h", patch).await.unwrap();
        assert_eq!(stored.outcome, WriteOutcome::Created);

        let stored = remote
            .merge(
                "h",
                RecordPatch {
                    year: Some(1996),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stored.outcome, WriteOutcome::Updated);
        assert_eq!(stored.record.fields.year, 1996);
    }

    #[test]
    fn only_changing_writes_publish() {
        let remote = MemoryRemote::new();
        let mut feed = remote.shared.feed.subscribe();
        feed.borrow_and_update();

        let result = remote.apply(Mutation::delete("missing")).unwrap();
        assert_eq!(result.outcome, WriteOutcome::Unchanged);
        assert!(!feed.has_changed().unwrap());

        let result = remote.apply(Mutation::Create(new_record("a", "A"))).unwrap();
        assert_eq!(result.outcome, WriteOutcome::Created);
        assert!(feed.has_changed().unwrap());
        assert_eq!(
            remote.writes(),
            vec![
                RemoteCall::Delete("missing".into()),
                RemoteCall::Create("a".into()),
            ]
        );
    }

    #[tokio::test]
    async fn revoked_remote_refuses_calls() {
        let remote = MemoryRemote::new();
        remote.revoke_access("signed out");
        assert_eq!(
            remote.list().await.unwrap_err(),
            TransportError::PermissionDenied("signed out".into())
        );
    }
}
