//! Error types for the ReelRack engine.

use crate::RecordId;
use thiserror::Error;

/// Rejected user input for a catalog draft.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is required")]
    EmptyTitle,

    #[error("type is required: movie or series")]
    MissingKind,

    #[error("year is required")]
    MissingYear,

    #[error("enter a valid year: {0:?} is not a number")]
    InvalidYear(String),
}

/// All possible errors from the ReelRack engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("record already exists: {0}")]
    RecordAlreadyExists(RecordId),

    #[error("document {id} would be created without required field '{field}'")]
    IncompleteDocument { id: RecordId, field: &'static str },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid import file: {0}")]
    ImportFormat(String),

    #[error("unknown {what}: {value:?}")]
    UnknownValue { what: &'static str, value: String },

    #[error("invalid asset path: {0}")]
    InvalidAssetPath(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::RecordNotFound("t-1".into());
        assert_eq!(err.to_string(), "record not found: t-1");

        let err = Error::IncompleteDocument {
            id: "t-2".into(),
            field: "year",
        };
        assert_eq!(
            err.to_string(),
            "document t-2 would be created without required field 'year'"
        );

        let err: Error = ValidationError::InvalidYear("abc".into()).into();
        assert_eq!(
            err.to_string(),
            "validation failed: enter a valid year: \"abc\" is not a number"
        );
    }
}
