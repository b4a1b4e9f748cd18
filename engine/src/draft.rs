//! Drafts: unvalidated record input from forms and import files.
//!
//! A draft is what an editor or an import file hands over. Validation turns it
//! into [`RecordFields`] or rejects it before anything touches the remote store.

use crate::{normalize_genres, Genre, Kind, RecordFields, RecordId, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};

/// A year exactly as it was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawYear {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawYear {
    /// Interpret the input as a calendar year.
    pub fn parse(&self) -> Result<i32, ValidationError> {
        match self {
            RawYear::Int(n) => i32::try_from(*n).map_err(|_| invalid(n)),
            RawYear::Float(f) => float_year(*f).ok_or_else(|| invalid(f)),
            RawYear::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::MissingYear);
                }
                trimmed
                    .parse::<i32>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(float_year))
                    .ok_or_else(|| ValidationError::InvalidYear(text.clone()))
            }
        }
    }
}

impl From<i32> for RawYear {
    fn from(year: i32) -> Self {
        RawYear::Int(year.into())
    }
}

impl From<&str> for RawYear {
    fn from(text: &str) -> Self {
        RawYear::Text(text.to_string())
    }
}

fn float_year(f: f64) -> Option<i32> {
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn invalid(value: impl ToString) -> ValidationError {
    ValidationError::InvalidYear(value.to_string())
}

/// Deserialize `null` as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unvalidated input for an upsert.
///
/// `id` is absent for an entry that has never been persisted. `kind` is
/// absent only for import elements that carry no `kind`/`type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub year: Option<RawYear>,
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<Genre>,
    #[serde(default, alias = "cast", deserialize_with = "nullable")]
    pub cast_summary: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub trailer_url: String,
}

impl RecordDraft {
    /// A fresh draft with the required inputs.
    pub fn new(title: impl Into<String>, kind: Kind, year: impl Into<RawYear>) -> Self {
        Self {
            title: title.into(),
            kind: Some(kind),
            year: Some(year.into()),
            ..Default::default()
        }
    }

    /// Draft for editing an existing record.
    pub fn from_record(record: &crate::CatalogRecord) -> Self {
        let fields = &record.fields;
        Self {
            id: Some(record.id.clone()),
            title: fields.title.clone(),
            kind: Some(fields.kind),
            year: Some(fields.year.into()),
            genres: fields.genres.clone(),
            cast_summary: fields.cast_summary.clone(),
            description: fields.description.clone(),
            poster_url: fields.poster_url.clone(),
            trailer_url: fields.trailer_url.clone(),
        }
    }

    /// Check the draft and produce the fields to write.
    ///
    /// The title is stored trimmed; genres are de-duplicated.
    pub fn validate(&self) -> Result<RecordFields, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let year = self
            .year
            .as_ref()
            .ok_or(ValidationError::MissingYear)?
            .parse()?;
        let kind = self.kind.ok_or(ValidationError::MissingKind)?;

        Ok(RecordFields {
            title: title.to_string(),
            kind,
            year,
            genres: normalize_genres(self.genres.clone()),
            cast_summary: self.cast_summary.clone(),
            description: self.description.clone(),
            poster_url: self.poster_url.clone(),
            trailer_url: self.trailer_url.clone(),
        })
    }
}
