//! The live, derived catalog view.
//!
//! [`LiveCatalog`] subscribes to a mirror and recomputes the query view on
//! every snapshot and every query change. A transport error keeps the last
//! good snapshot on screen and is recorded alongside it.

use crate::error::{Result, TransportError};
use crate::mirror::{RecordList, RemoteCollectionMirror, Subscription};
use reelrack_engine::{bulk, CatalogQuery, CatalogRecord};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// One rendering of the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogView {
    /// Records passing the query, in query order
    pub records: Vec<CatalogRecord>,
    /// Size of the snapshot the view was derived from
    pub total: usize,
    pub query: CatalogQuery,
    /// Whether a snapshot has arrived yet
    pub loaded: bool,
    /// Error that ended the subscription, if any
    pub last_error: Option<TransportError>,
}

impl CatalogView {
    /// Pretty JSON of the records currently shown.
    pub fn export_json(&self) -> Result<String> {
        Ok(bulk::export_json(&self.records)?)
    }
}

#[derive(Debug, Default)]
struct ViewState {
    snapshot: Option<RecordList>,
    query: CatalogQuery,
    last_error: Option<TransportError>,
}

impl ViewState {
    fn derive(&self) -> CatalogView {
        let records: &[CatalogRecord] = self.snapshot.as_deref().unwrap_or(&[]);
        CatalogView {
            records: self.query.run(records),
            total: records.len(),
            query: self.query.clone(),
            loaded: self.snapshot.is_some(),
            last_error: self.last_error.clone(),
        }
    }
}

struct Shared {
    state: Mutex<ViewState>,
    views: watch::Sender<Arc<CatalogView>>,
}

impl Shared {
    fn update(&self, change: impl FnOnce(&mut ViewState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut state);
        self.views.send_replace(Arc::new(state.derive()));
    }
}

/// A mirror subscription feeding the query engine.
pub struct LiveCatalog {
    shared: Arc<Shared>,
    subscription: Subscription,
}

impl LiveCatalog {
    /// Subscribe to `mirror` with the default query.
    pub fn start(mirror: &dyn RemoteCollectionMirror) -> Self {
        Self::with_query(mirror, CatalogQuery::default())
    }

    /// Subscribe to `mirror` with an initial query.
    pub fn with_query(mirror: &dyn RemoteCollectionMirror, query: CatalogQuery) -> Self {
        let state = ViewState {
            query,
            ..Default::default()
        };
        let (views, _) = watch::channel(Arc::new(state.derive()));
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            views,
        });

        let on_change = {
            let shared = Arc::clone(&shared);
            Arc::new(move |records: RecordList| {
                tracing::debug!(records = records.len(), "catalog snapshot received");
                shared.update(|state| {
                    state.snapshot = Some(records);
                    state.last_error = None;
                });
            })
        };
        let on_error = {
            let shared = Arc::clone(&shared);
            Arc::new(move |error: TransportError| {
                tracing::warn!(error = %error, "catalog subscription failed");
                shared.update(|state| state.last_error = Some(error));
            })
        };

        let subscription = mirror.subscribe(on_change, on_error);
        Self {
            shared,
            subscription,
        }
    }

    /// Replace the query and recompute the view.
    pub fn set_query(&self, query: CatalogQuery) {
        self.shared.update(|state| state.query = query);
    }

    /// The current view.
    pub fn view(&self) -> Arc<CatalogView> {
        Arc::clone(&self.shared.views.borrow())
    }

    /// Receiver notified whenever the view changes.
    pub fn watch(&self) -> watch::Receiver<Arc<CatalogView>> {
        self.shared.views.subscribe()
    }

    /// Latest snapshot received, if any.
    pub fn snapshot(&self) -> Option<RecordList> {
        let state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.snapshot.clone()
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.view().last_error.clone()
    }

    /// Whether the underlying subscription has ended.
    pub fn is_closed(&self) -> bool {
        self.subscription.is_finished()
    }

    /// Stop the subscription; the last view stays readable through earlier
    /// [`LiveCatalog::watch`] receivers.
    pub async fn shutdown(self) {
        self.subscription.unsubscribe().await;
    }
}
