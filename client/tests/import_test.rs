//! Bulk import and export through the coordinator.

use std::sync::Arc;

use reelrack_client::bulk::{export_catalog, import_catalog, ImportOutcome};
use reelrack_client::{
    CatalogError, CatalogMutationCoordinator, Identity, MemoryBlobStore, MemoryRemote, Session,
};
use reelrack_engine::{CatalogQuery, Kind, ValidationError};

fn setup() -> (MemoryRemote, CatalogMutationCoordinator) {
    let remote = MemoryRemote::new();
    let coordinator = CatalogMutationCoordinator::new(
        Arc::new(remote.clone()),
        Arc::new(MemoryBlobStore::default()),
    );
    (remote, coordinator)
}

fn admin() -> Session {
    Session::resolve(Some(Identity::new("admin-1")), Some("admin-1"))
}

#[tokio::test]
async fn import_continues_past_bad_items() {
    let (remote, coordinator) = setup();
    let text = r#"[
        {"title": "Interstellar", "type": "movie", "year": 2014, "genres": ["Sci-Fi"]},
        {"title": "Broken", "type": "movie", "year": "abc"},
        {"title": "Untyped", "year": 2001},
        {"title": "The Wire", "type": "tv", "year": "2002", "cast": "Dominic West"}
    ]"#;

    let report = import_catalog(&coordinator, &admin(), text).await.unwrap();

    assert_eq!(report.created(), 2);
    assert_eq!(report.failed(), 2);
    let mut failures = report.failures();
    let (item, error) = failures.next().unwrap();
    assert_eq!(item.index, 1);
    assert_eq!(item.title, "Broken");
    assert!(matches!(
        error,
        CatalogError::Validation(ValidationError::InvalidYear(_))
    ));
    let (item, error) = failures.next().unwrap();
    assert_eq!(item.index, 2);
    assert!(matches!(
        error,
        CatalogError::Validation(ValidationError::MissingKind)
    ));

    let snapshot = remote.snapshot();
    assert_eq!(snapshot.len(), 2);
    let wire = snapshot.iter().find(|r| r.title() == "The Wire").unwrap();
    assert_eq!(wire.fields.kind, Kind::Series);
    assert_eq!(wire.fields.cast_summary, "Dominic West");
}

#[tokio::test]
async fn malformed_file_writes_nothing() {
    let (remote, coordinator) = setup();

    let err = import_catalog(&coordinator, &admin(), r#"{"title": "Dune"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ImportFormat(_)));

    let err = import_catalog(&coordinator, &admin(), r#"[{"title": "Dune", "year": 2021}, "oops"]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ImportFormat(_)));

    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn import_requires_admin() {
    let (remote, coordinator) = setup();
    let err = import_catalog(&coordinator, &Session::anonymous(), "[]")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::AuthorizationDenial { .. }));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn export_then_reimport_restores_catalog() {
    let (source, coordinator) = setup();
    let session = admin();
    let text = r#"[
        {"title": "Alien", "type": "movie", "year": 1979, "posterUrl": "https://cdn.test/posters/alien.jpg"},
        {"title": "Heat", "type": "movie", "year": 1995}
    ]"#;
    import_catalog(&coordinator, &session, text).await.unwrap();

    let exported = export_catalog(&CatalogQuery::new().run(&source.snapshot())).unwrap();

    // Ids travel with the export, so a fresh store gets the same documents
    let (target, coordinator) = setup();
    let report = import_catalog(&coordinator, &session, &exported).await.unwrap();
    assert_eq!(report.created(), 2);
    assert!(report
        .items
        .iter()
        .all(|item| matches!(item.outcome, ImportOutcome::Created(_))));

    let mut source_ids: Vec<_> = source.snapshot().into_iter().map(|r| r.id).collect();
    let mut target_ids: Vec<_> = target.snapshot().into_iter().map(|r| r.id).collect();
    source_ids.sort();
    target_ids.sort();
    assert_eq!(source_ids, target_ids);

    let alien = target.snapshot().into_iter().find(|r| r.title() == "Alien").unwrap();
    assert_eq!(alien.fields.poster_url, "https://cdn.test/posters/alien.jpg");
    assert_eq!(alien.created_by.as_deref(), Some("admin-1"));

    // Importing the same file again updates in place
    let report = import_catalog(&coordinator, &session, &exported).await.unwrap();
    assert_eq!(report.updated(), 2);
    assert_eq!(target.snapshot().len(), 2);
}
