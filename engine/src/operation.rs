//! Document writes.
//!
//! Every change to the collection is expressed as a [`Mutation`] and applied
//! by a store, never as a direct field assignment on a stored record.

use crate::{NewRecord, RecordId, RecordPatch};
use serde::{Deserialize, Serialize};

/// A single write against the catalog collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Mutation {
    /// Create a complete document under a new id.
    Create(NewRecord),
    /// Merge a partial update; creates the document if absent and complete.
    Merge { id: RecordId, patch: RecordPatch },
    /// Remove the document. Removing an absent id is not an error.
    Delete { id: RecordId },
}

impl Mutation {
    /// Get the record ID this mutation targets.
    pub fn record_id(&self) -> &RecordId {
        match self {
            Mutation::Create(record) => &record.id,
            Mutation::Merge { id, .. } => id,
            Mutation::Delete { id } => id,
        }
    }

    pub fn merge(id: impl Into<RecordId>, patch: RecordPatch) -> Self {
        Mutation::Merge {
            id: id.into(),
            patch,
        }
    }

    pub fn delete(id: impl Into<RecordId>) -> Self {
        Mutation::Delete { id: id.into() }
    }
}

/// What a mutation did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Created,
    Updated,
    Deleted,
    /// Delete of an id that was not present.
    Unchanged,
}

impl WriteOutcome {
    /// Whether subscribers need a fresh snapshot.
    pub fn changed(&self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}
