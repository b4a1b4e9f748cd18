//! # ReelRack Client
//!
//! Async client core for the ReelRack catalog.
//!
//! - [`mirror`] keeps a live, ordered copy of the remote collection
//! - [`view::LiveCatalog`] derives the filtered, sorted view from it
//! - [`upload`] moves poster and trailer blobs into storage with progress
//! - [`coordinator::CatalogMutationCoordinator`] validates drafts, uploads
//!   assets and performs the single document write
//!
//! Remote access goes through two seams, [`remote::DocumentStore`] and
//! [`upload::AssetUploader`]. The [`http`] module implements them against the
//! ReelRack server; [`memory`] implements them in-process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reelrack_client::{
//!     AssetUploads, CatalogMutationCoordinator, Identity, LiveCatalog, MemoryBlobStore,
//!     MemoryRemote, Session,
//! };
//! use reelrack_engine::{Kind, RecordDraft};
//!
//! # async fn run() -> reelrack_client::Result<()> {
//! let remote = MemoryRemote::new();
//! let coordinator =
//!     CatalogMutationCoordinator::new(Arc::new(remote.clone()), Arc::new(MemoryBlobStore::default()));
//! let session = Session::resolve(Some(Identity::new("admin")), Some("admin"));
//!
//! let live = LiveCatalog::start(&remote);
//! coordinator
//!     .upsert(&session, RecordDraft::new("Dune", Kind::Movie, 2021), AssetUploads::none(), None)
//!     .await?;
//! println!("{} titles", live.view().total);
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod memory;
pub mod mirror;
pub mod remote;
pub mod session;
pub mod upload;
pub mod view;

// Re-export main types at crate root
pub use config::{ClientConfig, ConfigError};
pub use coordinator::{AssetUploads, CatalogMutationCoordinator, UploadProgress, UpsertOutcome};
pub use error::{CatalogError, Result, TransportError};
pub use memory::{MemoryBlobStore, MemoryRemote, RemoteCall};
pub use mirror::{RecordList, RemoteCollectionMirror, Subscription};
pub use remote::{DocumentStore, StoredRecord};
pub use session::{Identity, Session};
pub use upload::{AssetBlob, AssetPath, AssetUploader, RetrievalUrl};
pub use view::{CatalogView, LiveCatalog};
