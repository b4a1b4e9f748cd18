//! Live mirror of the remote catalog collection.
//!
//! A mirror delivers full snapshots: every change event carries the complete,
//! freshly ordered collection, never a delta.

use crate::error::TransportError;
use reelrack_engine::CatalogRecord;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared, immutable snapshot of the collection.
pub type RecordList = Arc<[CatalogRecord]>;

/// Receives every snapshot.
pub type SnapshotCallback = Arc<dyn Fn(RecordList) + Send + Sync>;

/// Receives the transport error that ends a subscription.
pub type ErrorCallback = Arc<dyn Fn(TransportError) + Send + Sync>;

/// A subscribable view of the remote collection.
pub trait RemoteCollectionMirror: Send + Sync {
    /// Start delivering snapshots.
    ///
    /// The first snapshot is delivered as soon as it is available, then one
    /// after every remote change. A transport error is reported once through
    /// `on_error` and ends the subscription; it is not retried.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe(&self, on_change: SnapshotCallback, on_error: ErrorCallback) -> Subscription;
}

/// Handle to a running subscription.
///
/// Dropping the handle aborts the subscription; [`Subscription::unsubscribe`]
/// additionally waits until it has stopped.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Run a subscription loop on the current runtime.
    pub fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: Some(tokio::spawn(task)),
        }
    }

    /// Whether the subscription has ended on its own (after an error).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop the subscription. No callback fires after this returns.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled or finished, either way it has stopped
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
