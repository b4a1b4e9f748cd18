//! In-process implementations of the remote seams.
//!
//! These back tests and local development. They follow the same contracts as
//! the HTTP implementations: store-assigned timestamps, full-snapshot push,
//! durable-before-resolve uploads.

mod blobs;
mod remote;

pub use blobs::MemoryBlobStore;
pub use remote::{MemoryRemote, RemoteCall};

use crate::error::TransportError;
use std::sync::PoisonError;

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> TransportError {
    TransportError::Storage("lock poisoned".to_string())
}
