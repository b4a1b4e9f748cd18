//! Bulk import and export of the catalog.

use crate::coordinator::{AssetUploads, CatalogMutationCoordinator};
use crate::error::{CatalogError, Result};
use crate::session::Session;
use chrono::{Datelike, NaiveDate};
use reelrack_engine::{bulk, CatalogRecord, RecordId, WriteOutcome};

/// What happened to one element of an import file.
#[derive(Debug)]
pub enum ImportOutcome {
    Created(RecordId),
    Updated(RecordId),
    Failed(CatalogError),
}

/// One element of an import file.
#[derive(Debug)]
pub struct ImportItem {
    /// Position in the file
    pub index: usize,
    pub title: String,
    pub outcome: ImportOutcome,
}

/// Per-item outcome of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub items: Vec<ImportItem>,
}

impl ImportReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Created(_)))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Updated(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Failed(_)))
    }

    /// Items that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&ImportItem, &CatalogError)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ImportOutcome::Failed(e) => Some((item, e)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}

/// Import a JSON array of records through `upsert`, one element at a time.
///
/// The whole file is parsed first; a malformed file fails with
/// `ImportFormat` and writes nothing. A failing element is recorded in the
/// report and the import moves on.
pub async fn import_catalog(
    coordinator: &CatalogMutationCoordinator,
    session: &Session,
    text: &str,
) -> Result<ImportReport> {
    session.require_admin("import")?;
    let drafts = bulk::parse_import(text)?;
    tracing::info!(items = drafts.len(), "importing catalog");

    let mut report = ImportReport::default();
    for (index, draft) in drafts.into_iter().enumerate() {
        let title = draft.title.clone();
        let outcome = match coordinator
            .upsert(session, draft, AssetUploads::none(), None)
            .await
        {
            Ok(upserted) if upserted.outcome == WriteOutcome::Created => {
                ImportOutcome::Created(upserted.record.id)
            }
            Ok(upserted) => ImportOutcome::Updated(upserted.record.id),
            Err(e) => {
                tracing::warn!(index, title = %title, error = %e, "import item failed");
                ImportOutcome::Failed(e)
            }
        };
        report.items.push(ImportItem {
            index,
            title,
            outcome,
        });
    }

    tracing::info!(
        created = report.created(),
        updated = report.updated(),
        failed = report.failed(),
        "catalog import finished"
    );
    Ok(report)
}

/// Pretty JSON of a derived view.
pub fn export_catalog(view: &[CatalogRecord]) -> Result<String> {
    Ok(bulk::export_json(view)?)
}

/// `catalog-export-YYYY-MM-DD.json`.
pub fn export_file_name(date: NaiveDate) -> String {
    bulk::export_file_name(date.year(), date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(export_file_name(date), "catalog-export-2026-10-16.json");
    }

    #[test]
    fn report_counts() {
        let report = ImportReport {
            items: vec![
                ImportItem {
                    index: 0,
                    title: "A".into(),
                    outcome: ImportOutcome::Created("a".into()),
                },
                ImportItem {
                    index: 1,
                    title: "B".into(),
                    outcome: ImportOutcome::Updated("b".into()),
                },
                ImportItem {
                    index: 2,
                    title: "".into(),
                    outcome: ImportOutcome::Failed(CatalogError::Validation(
                        reelrack_engine::ValidationError::EmptyTitle,
                    )),
                },
            ],
        };
        assert_eq!(report.created(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().next().map(|(item, _)| item.index), Some(2));
    }
}
