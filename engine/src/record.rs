//! Record types for the catalog collection.

use crate::{error::Result, Error, RecordId, Timestamp, Uid, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of catalog entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Movie,
    /// Older exports spell this `tv`.
    #[serde(alias = "tv")]
    Series,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Movie => "movie",
            Kind::Series => "series",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "movie" => Ok(Kind::Movie),
            "series" | "tv" => Ok(Kind::Series),
            other => Err(Error::UnknownValue {
                what: "kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Genre tag from the controlled vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    History,
    Horror,
    Mystery,
    Romance,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Thriller,
}

impl Genre {
    /// Every genre, in display order.
    pub const ALL: [Genre; 15] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Family,
        Genre::Fantasy,
        Genre::History,
        Genre::Horror,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Family => "Family",
            Genre::Fantasy => "Fantasy",
            Genre::History => "History",
            Genre::Horror => "Horror",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownValue {
                what: "genre",
                value: s.to_string(),
            })
    }
}

/// Drop repeated genres, keeping the first occurrence of each.
pub fn normalize_genres(genres: Vec<Genre>) -> Vec<Genre> {
    let mut out = Vec::with_capacity(genres.len());
    for genre in genres {
        if !out.contains(&genre) {
            out.push(genre);
        }
    }
    out
}

/// The editable catalog fields of a record, all populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub title: String,
    #[serde(alias = "type")]
    pub kind: Kind,
    pub year: i32,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, alias = "cast")]
    pub cast_summary: String,
    #[serde(default)]
    pub description: String,
    /// Empty means "use the placeholder poster".
    #[serde(default)]
    pub poster_url: String,
    /// Empty means "no trailer".
    #[serde(default)]
    pub trailer_url: String,
}

impl RecordFields {
    /// Fields with the given required values and everything else empty.
    pub fn new(title: impl Into<String>, kind: Kind, year: i32) -> Self {
        Self {
            title: title.into(),
            kind,
            year,
            genres: Vec::new(),
            cast_summary: String::new(),
            description: String::new(),
            poster_url: String::new(),
            trailer_url: String::new(),
        }
    }

    /// Builder-style genre assignment.
    pub fn with_genres(mut self, genres: impl IntoIterator<Item = Genre>) -> Self {
        self.genres = normalize_genres(genres.into_iter().collect());
        self
    }

    /// Check the invariants every stored document must hold.
    pub fn check_well_formed(&self) -> std::result::Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// A patch that sets every field, asset URLs included.
    pub fn into_patch(self) -> RecordPatch {
        RecordPatch {
            title: Some(self.title),
            kind: Some(self.kind),
            year: Some(self.year),
            genres: Some(self.genres),
            cast_summary: Some(self.cast_summary),
            description: Some(self.description),
            poster_url: Some(self.poster_url),
            trailer_url: Some(self.trailer_url),
            created_by: None,
        }
    }
}

/// A catalog entry as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Stable identifier, unique within the collection
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RecordFields,
    /// Identity of the creator, set once at creation
    #[serde(default)]
    pub created_by: Option<Uid>,
    /// Server-assigned creation time (milliseconds since epoch)
    pub created_at: Timestamp,
    /// Server-assigned time of the last write (milliseconds since epoch)
    pub updated_at: Timestamp,
}

impl CatalogRecord {
    /// Create a record stamped with `timestamp` for both creation and update.
    pub fn new(
        id: impl Into<RecordId>,
        fields: RecordFields,
        created_by: Option<Uid>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            fields,
            created_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    /// Merge a patch into this record.
    ///
    /// Absent patch fields keep their stored value. `created_by` in the patch
    /// is ignored: it is only honoured when a merge creates the document.
    pub fn apply_patch(
        &mut self,
        patch: &RecordPatch,
        timestamp: Timestamp,
    ) -> std::result::Result<(), ValidationError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
        }

        let fields = &mut self.fields;
        if let Some(title) = &patch.title {
            fields.title = title.clone();
        }
        if let Some(kind) = patch.kind {
            fields.kind = kind;
        }
        if let Some(year) = patch.year {
            fields.year = year;
        }
        if let Some(genres) = &patch.genres {
            fields.genres = normalize_genres(genres.clone());
        }
        if let Some(cast) = &patch.cast_summary {
            fields.cast_summary = cast.clone();
        }
        if let Some(description) = &patch.description {
            fields.description = description.clone();
        }
        if let Some(url) = &patch.poster_url {
            fields.poster_url = url.clone();
        }
        if let Some(url) = &patch.trailer_url {
            fields.trailer_url = url.clone();
        }
        self.updated_at = timestamp;
        Ok(())
    }
}

/// A typed partial update.
///
/// `None` means the field is absent from the write and keeps its stored
/// value; it never clears. Asset URLs are cleared with an explicit `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "type")]
    pub kind: Option<Kind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "cast")]
    pub cast_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    /// Creator identity, used only if this merge creates the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uid>,
}

impl RecordPatch {
    /// Check if the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == RecordPatch::default()
    }

    /// Build a brand new document from this patch.
    ///
    /// Used when a merge targets an id that does not exist yet. The patch must
    /// carry every required field so that no partial document is ever stored.
    pub fn into_record(self, id: impl Into<RecordId>, timestamp: Timestamp) -> Result<CatalogRecord> {
        let id = id.into();
        let title = self.title.ok_or_else(|| Error::IncompleteDocument {
            id: id.clone(),
            field: "title",
        })?;
        let kind = self.kind.ok_or_else(|| Error::IncompleteDocument {
            id: id.clone(),
            field: "kind",
        })?;
        let year = self.year.ok_or_else(|| Error::IncompleteDocument {
            id: id.clone(),
            field: "year",
        })?;

        let fields = RecordFields {
            title,
            kind,
            year,
            genres: normalize_genres(self.genres.unwrap_or_default()),
            cast_summary: self.cast_summary.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            poster_url: self.poster_url.unwrap_or_default(),
            trailer_url: self.trailer_url.unwrap_or_default(),
        };
        fields.check_well_formed()?;

        Ok(CatalogRecord::new(id, fields, self.created_by, timestamp))
    }
}

/// A complete document for a first write under a known id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(default)]
    pub created_by: Option<Uid>,
}

impl NewRecord {
    pub fn new(id: impl Into<RecordId>, fields: RecordFields, created_by: Option<Uid>) -> Self {
        Self {
            id: id.into(),
            fields,
            created_by,
        }
    }

    /// Stamp the document with the store's creation time.
    pub fn into_record(self, timestamp: Timestamp) -> Result<CatalogRecord> {
        self.fields.check_well_formed()?;
        let mut fields = self.fields;
        fields.genres = normalize_genres(fields.genres);
        Ok(CatalogRecord::new(self.id, fields, self.created_by, timestamp))
    }
}
