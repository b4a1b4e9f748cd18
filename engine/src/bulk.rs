//! Bulk export and import formats.
//!
//! An export is a pretty-printed JSON array of catalog records, in the order
//! of the view it was taken from. An import file is a JSON array of
//! record-shaped objects; each element becomes a [`RecordDraft`].

use crate::{error::Result, CatalogRecord, Error, RecordDraft};

/// Serialize a derived view for download.
pub fn export_json(records: &[CatalogRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| Error::Serialization(e.to_string()))
}

/// Suggested download name for an export taken on the given calendar date.
pub fn export_file_name(year: i32, month: u32, day: u32) -> String {
    format!("catalog-export-{year:04}-{month:02}-{day:02}.json")
}

/// Parse an import file into drafts.
///
/// The whole file is decoded before anything is returned, so a malformed
/// element rejects the import as a whole.
pub fn parse_import(text: &str) -> Result<Vec<RecordDraft>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::ImportFormat(e.to_string()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(Error::ImportFormat(format!(
                "expected a JSON array, found {}",
                json_type_name(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(Error::ImportFormat(format!(
                    "item {index}: expected an object, found {}",
                    json_type_name(&item)
                )));
            }
            serde_json::from_value(item)
                .map_err(|e| Error::ImportFormat(format!("item {index}: {e}")))
        })
        .collect()
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
