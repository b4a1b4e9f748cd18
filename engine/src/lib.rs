//! # ReelRack Engine
//!
//! The deterministic core of the ReelRack catalog.
//!
//! This crate holds the catalog data model, the typed merge semantics of
//! document writes, draft validation and the query engine that derives the
//! browsable view from a snapshot. It performs no IO: the same inputs always
//! produce the same outputs.
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`CatalogRecord`] is a movie or series with a stable id, the editable
//! [`RecordFields`], the write-once creator identity and server timestamps.
//!
//! ### Writes
//!
//! Changes are expressed as [`Mutation`]s:
//! - [`Mutation::Create`] - a complete document under a new id
//! - [`Mutation::Merge`] - a [`RecordPatch`]; absent fields are kept, never cleared
//! - [`Mutation::Delete`] - removal by id
//!
//! ### Query
//!
//! [`CatalogQuery::run`] filters by text, kind and genre, then sorts by year
//! or title. It never mutates its input.
//!
//! ## Quick Start
//!
//! ```rust
//! use reelrack_engine::{
//!     CatalogQuery, CatalogStore, Genre, Kind, Mutation, NewRecord, RecordDraft,
//! };
//!
//! // 1. Validate user input
//! let mut draft = RecordDraft::new("Dune", Kind::Movie, 2021);
//! draft.genres = vec![Genre::SciFi];
//! let fields = draft.validate().unwrap();
//!
//! // 2. Write it to a store
//! let mut store = CatalogStore::new();
//! let op = Mutation::Create(NewRecord::new("title-1", fields, Some("admin".into())));
//! let result = store.apply(op, 1706745600000).unwrap();
//! assert_eq!(result.record_id, "title-1");
//!
//! // 3. Derive a view
//! let view = CatalogQuery::new().with_text("dune").run(&store.snapshot());
//! assert_eq!(view.len(), 1);
//! ```

pub mod asset;
pub mod bulk;
pub mod draft;
pub mod error;
pub mod operation;
pub mod query;
pub mod record;
pub mod store;

// Re-export main types at crate root
pub use asset::{asset_path, content_type_for, validate_asset_path, AssetKind};
pub use draft::{RawYear, RecordDraft};
pub use error::{Error, ValidationError};
pub use operation::{Mutation, WriteOutcome};
pub use query::{compare_titles, derive_view, CatalogQuery, GenreFilter, KindFilter, SortKey};
pub use record::{normalize_genres, CatalogRecord, Genre, Kind, NewRecord, RecordFields, RecordPatch};
pub use store::{ApplyResult, CatalogStore};

/// Type aliases for clarity
pub type RecordId = String;
pub type Uid = String;
pub type Timestamp = u64;
