//! Store - the in-memory catalog collection.
//!
//! The store holds every record keyed by id, applies [`Mutation`]s with the
//! collection's merge semantics, and produces ordered snapshots.

use crate::{
    error::Result, CatalogRecord, Error, Mutation, NewRecord, RecordId, RecordPatch, Timestamp,
    WriteOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored record plus its insertion sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    record: CatalogRecord,
    seq: u64,
}

/// Result of applying a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// The record ID that was affected
    pub record_id: RecordId,
    /// What happened to it
    pub outcome: WriteOutcome,
    /// The document after the write (`None` after a delete)
    pub record: Option<CatalogRecord>,
}

/// In-memory catalog collection.
///
/// Snapshot order is newest creation first; records created at the same
/// timestamp are ordered by insertion, latest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogStore {
    records: HashMap<RecordId, Entry>,
    next_seq: u64,
}

impl CatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot (newest first), preserving its order.
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let records: Vec<CatalogRecord> = records.into_iter().collect();
        let mut store = Self::new();
        for record in records.into_iter().rev() {
            store.insert(record);
        }
        store
    }

    fn insert(&mut self, record: CatalogRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records
            .insert(record.id.clone(), Entry { record, seq });
    }

    /// Apply a mutation at the given server time.
    pub fn apply(&mut self, mutation: Mutation, timestamp: Timestamp) -> Result<ApplyResult> {
        match mutation {
            Mutation::Create(new_record) => self.create(new_record, timestamp),
            Mutation::Merge { id, patch } => self.merge(&id, patch, timestamp),
            Mutation::Delete { id } => Ok(self.delete(&id)),
        }
    }

    /// Create a complete document. Fails if the id is taken.
    pub fn create(&mut self, new_record: NewRecord, timestamp: Timestamp) -> Result<ApplyResult> {
        if self.records.contains_key(&new_record.id) {
            return Err(Error::RecordAlreadyExists(new_record.id));
        }

        let record = new_record.into_record(timestamp)?;
        let record_id = record.id.clone();
        self.insert(record.clone());

        Ok(ApplyResult {
            record_id,
            outcome: WriteOutcome::Created,
            record: Some(record),
        })
    }

    /// Merge a patch into the document, creating it if absent.
    ///
    /// Creating through a merge requires a complete patch; the `created_by`
    /// identity in the patch is only used in that case.
    pub fn merge(
        &mut self,
        id: &str,
        patch: RecordPatch,
        timestamp: Timestamp,
    ) -> Result<ApplyResult> {
        if let Some(entry) = self.records.get_mut(id) {
            entry.record.apply_patch(&patch, timestamp)?;
            return Ok(ApplyResult {
                record_id: id.to_string(),
                outcome: WriteOutcome::Updated,
                record: Some(entry.record.clone()),
            });
        }

        let record = patch.into_record(id, timestamp)?;
        self.insert(record.clone());

        Ok(ApplyResult {
            record_id: id.to_string(),
            outcome: WriteOutcome::Created,
            record: Some(record),
        })
    }

    /// Remove a document. Removing an absent id reports `Unchanged`.
    pub fn delete(&mut self, id: &str) -> ApplyResult {
        let outcome = match self.records.remove(id) {
            Some(_) => WriteOutcome::Deleted,
            None => WriteOutcome::Unchanged,
        };
        ApplyResult {
            record_id: id.to_string(),
            outcome,
            record: None,
        }
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&CatalogRecord> {
        self.records.get(id).map(|entry| &entry.record)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, newest creation first.
    pub fn snapshot(&self) -> Vec<CatalogRecord> {
        let mut entries: Vec<&Entry> = self.records.values().collect();
        entries.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.record.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Genre, Kind, RecordFields, ValidationError};

    fn new_record(id: &str, title: &str, year: i32) -> NewRecord {
        NewRecord::new(
            id,
            RecordFields::new(title, Kind::Movie, year),
            Some("admin".into()),
        )
    }

    #[test]
    fn create_and_get() {
        let mut store = CatalogStore::new();
        let result = store.create(new_record("t-1", "Dune", 2021), 1000).unwrap();

        assert_eq!(result.outcome, WriteOutcome::Created);
        let record = store.get("t-1").unwrap();
        assert_eq!(record.title(), "Dune");
        assert_eq!(record.created_at, 1000);
        assert_eq!(record.updated_at, 1000);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_duplicate_fails() {
        let mut store = CatalogStore::new();
        store.create(new_record("t-1", "Dune", 2021), 1000).unwrap();

        let result = store.create(new_record("t-1", "Dune Part Two", 2024), 2000);
        assert_eq!(result, Err(Error::RecordAlreadyExists("t-1".into())));
        assert_eq!(store.get("t-1").unwrap().title(), "Dune");
    }

    #[test]
    fn create_blank_title_fails() {
        let mut store = CatalogStore::new();
        let result = store.create(new_record("t-1", "  ", 2021), 1000);
        assert_eq!(result, Err(Error::Validation(ValidationError::EmptyTitle)));
        assert!(store.is_empty());
    }

    #[test]
    fn merge_updates_existing() {
        let mut store = CatalogStore::new();
        store.create(new_record("t-1", "Dune", 2021), 1000).unwrap();

        let patch = RecordPatch {
            genres: Some(vec![Genre::SciFi]),
            created_by: Some("someone-else".into()),
            ..Default::default()
        };
        let result = store.merge("t-1", patch, 2000).unwrap();

        assert_eq!(result.outcome, WriteOutcome::Updated);
        let record = store.get("t-1").unwrap();
        assert_eq!(record.fields.genres, vec![Genre::SciFi]);
        assert_eq!(record.fields.year, 2021);
        assert_eq!(record.created_by.as_deref(), Some("admin"));
        assert_eq!(record.created_at, 1000);
        assert_eq!(record.updated_at, 2000);
    }

    #[test]
    fn merge_creates_complete_document() {
        let mut store = CatalogStore::new();
        let mut patch = RecordFields::new("Heat", Kind::Movie, 1995).into_patch();
        patch.created_by = Some("admin".into());

        let result = store.merge("t-7", patch, 3000).unwrap();
        assert_eq!(result.outcome, WriteOutcome::Created);
        assert_eq!(store.get("t-7").unwrap().created_by.as_deref(), Some("admin"));
    }

    #[test]
    fn merge_refuses_partial_creation() {
        let mut store = CatalogStore::new();
        let patch = RecordPatch {
            title: Some("Heat".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.merge("t-7", patch, 3000),
            Err(Error::IncompleteDocument { .. })
        ));
        assert!(!store.contains("t-7"));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = CatalogStore::new();
        store.create(new_record("t-1", "Dune", 2021), 1000).unwrap();

        assert_eq!(store.delete("t-1").outcome, WriteOutcome::Deleted);
        assert_eq!(store.delete("t-1").outcome, WriteOutcome::Unchanged);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn snapshot_is_newest_first() {
        let mut store = CatalogStore::new();
        store.create(new_record("a", "First", 2000), 1000).unwrap();
        store.create(new_record("b", "Second", 2000), 3000).unwrap();
        store.create(new_record("c", "Third", 2000), 2000).unwrap();

        let ids: Vec<_> = store.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn snapshot_breaks_timestamp_ties_by_insertion() {
        let mut store = CatalogStore::new();
        for id in ["a", "b", "c"] {
            store.create(new_record(id, id, 2000), 1000).unwrap();
        }

        let ids: Vec<_> = store.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        // stable across calls
        let again: Vec<_> = store.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn apply_dispatches() {
        let mut store = CatalogStore::new();
        store
            .apply(Mutation::Create(new_record("t-1", "Dune", 2021)), 1000)
            .unwrap();
        store
            .apply(
                Mutation::merge(
                    "t-1",
                    RecordPatch {
                        description: Some("Spice".into()),
                        ..Default::default()
                    },
                ),
                1500,
            )
            .unwrap();
        assert_eq!(store.get("t-1").unwrap().fields.description, "Spice");

        let result = store.apply(Mutation::delete("t-1"), 2000).unwrap();
        assert_eq!(result.outcome, WriteOutcome::Deleted);
        assert!(result.record.is_none());
    }

    #[test]
    fn from_records_restores_collection() {
        let mut store = CatalogStore::new();
        store.create(new_record("a", "A", 2000), 1000).unwrap();
        store.create(new_record("b", "B", 2000), 2000).unwrap();

        let restored = CatalogStore::from_records(store.snapshot());
        assert_eq!(restored.snapshot(), store.snapshot());
    }
}
