//! Polling mirror.

use crate::config::ClientConfig;
use crate::mirror::{ErrorCallback, RecordList, RemoteCollectionMirror, SnapshotCallback, Subscription};
use crate::remote::DocumentStore;
use reelrack_engine::CatalogRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Shortest accepted polling interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Mirror that re-fetches the collection on a fixed interval.
///
/// The first snapshot is always emitted; later polls emit only when the
/// collection differs from the last emitted snapshot.
#[derive(Clone)]
pub struct PollingMirror {
    store: Arc<dyn DocumentStore>,
    interval: Duration,
}

impl PollingMirror {
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(store: Arc<dyn DocumentStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Poll at the configured `REELRACK_POLL_INTERVAL_MS`.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ClientConfig) -> Self {
        Self::new(store, config.poll_interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RemoteCollectionMirror for PollingMirror {
    fn subscribe(&self, on_change: SnapshotCallback, on_error: ErrorCallback) -> Subscription {
        let store = Arc::clone(&self.store);
        let period = self.interval;

        Subscription::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<CatalogRecord>> = None;

            loop {
                ticker.tick().await;
                let records = match store.list().await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!(error = %e, "snapshot poll failed");
                        on_error(e);
                        return;
                    }
                };
                if last.as_ref() == Some(&records) {
                    continue;
                }
                let snapshot: RecordList = records.clone().into();
                last = Some(records);
                on_change(snapshot);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRemote;

    #[test]
    fn zero_interval_is_raised_to_minimum() {
        let mirror = PollingMirror::new(Arc::new(MemoryRemote::new()), Duration::ZERO);
        assert_eq!(mirror.interval(), MIN_POLL_INTERVAL);
    }

    #[test]
    fn interval_comes_from_config() {
        let mut config = ClientConfig::new("http://localhost:3000");
        config.poll_interval = Duration::from_millis(750);
        let mirror = PollingMirror::from_config(Arc::new(MemoryRemote::new()), &config);
        assert_eq!(mirror.interval(), Duration::from_millis(750));
    }
}
