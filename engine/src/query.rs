//! Catalog query engine.
//!
//! Maps a snapshot and a [`CatalogQuery`] to a derived, ordered view. The
//! function is pure: it never mutates the snapshot and the same inputs always
//! produce the same output.

use crate::{CatalogRecord, Error, Genre, Kind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Kind filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl KindFilter {
    pub fn matches(&self, kind: Kind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Movie => kind == Kind::Movie,
            KindFilter::Series => kind == Kind::Series,
        }
    }
}

impl From<Kind> for KindFilter {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Movie => KindFilter::Movie,
            Kind::Series => KindFilter::Series,
        }
    }
}

/// Genre filter: `"all"` or a single genre tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GenreFilter {
    #[default]
    All,
    Only(Genre),
}

impl GenreFilter {
    pub fn matches(&self, genres: &[Genre]) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Only(genre) => genres.contains(genre),
        }
    }
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => f.write_str("all"),
            GenreFilter::Only(genre) => genre.fmt(f),
        }
    }
}

impl FromStr for GenreFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("all") {
            Ok(GenreFilter::All)
        } else {
            s.parse().map(GenreFilter::Only)
        }
    }
}

impl TryFrom<String> for GenreFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<GenreFilter> for String {
    fn from(filter: GenreFilter) -> Self {
        filter.to_string()
    }
}

/// Ordering of the derived view.
///
/// The short UI identifiers (`newest`, `oldest`, `a-z`, `z-a`) are accepted as
/// aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    #[serde(alias = "newest")]
    YearDesc,
    #[serde(alias = "oldest")]
    YearAsc,
    #[serde(alias = "a-z")]
    TitleAsc,
    #[serde(alias = "z-a")]
    TitleDesc,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "year-desc" | "newest" => Ok(SortKey::YearDesc),
            "year-asc" | "oldest" => Ok(SortKey::YearAsc),
            "title-asc" | "a-z" => Ok(SortKey::TitleAsc),
            "title-desc" | "z-a" => Ok(SortKey::TitleDesc),
            other => Err(Error::UnknownValue {
                what: "sort key",
                value: other.to_string(),
            }),
        }
    }
}

/// Query criteria for the derived catalog view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogQuery {
    /// Free-text search over title, cast and description
    pub text: String,
    pub kind: KindFilter,
    pub genre: GenreFilter,
    #[serde(alias = "sort")]
    pub sort_key: SortKey,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_genre(mut self, genre: GenreFilter) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_sort(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    /// Check whether a record passes the text, kind and genre filters.
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        self.matches_needle(record, &self.needle())
    }

    /// Derive the filtered, sorted view of `records`.
    pub fn run(&self, records: &[CatalogRecord]) -> Vec<CatalogRecord> {
        let needle = self.needle();
        let mut view: Vec<CatalogRecord> = records
            .iter()
            .filter(|r| self.matches_needle(r, &needle))
            .cloned()
            .collect();

        // sort_by is stable: equal keys keep snapshot order
        match self.sort_key {
            SortKey::YearDesc => view.sort_by(|a, b| b.fields.year.cmp(&a.fields.year)),
            SortKey::YearAsc => view.sort_by(|a, b| a.fields.year.cmp(&b.fields.year)),
            SortKey::TitleAsc => view.sort_by(|a, b| compare_titles(a.title(), b.title())),
            SortKey::TitleDesc => view.sort_by(|a, b| compare_titles(b.title(), a.title())),
        }

        view
    }

    fn needle(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_lowercase())
    }

    fn matches_needle(&self, record: &CatalogRecord, needle: &Option<String>) -> bool {
        let fields = &record.fields;
        if let Some(needle) = needle {
            let hit = [&fields.title, &fields.cast_summary, &fields.description]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        self.kind.matches(fields.kind) && self.genre.matches(&fields.genres)
    }
}

/// Collation for titles.
///
/// Primary order ignores case; titles equal under that fold fall back to a
/// plain code point comparison so the order stays total and reproducible.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

/// Convenience wrapper for [`CatalogQuery::run`].
pub fn derive_view(records: &[CatalogRecord], query: &CatalogQuery) -> Vec<CatalogRecord> {
    query.run(records)
}
