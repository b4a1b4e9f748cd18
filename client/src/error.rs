//! Error types for the client core.

use reelrack_engine::ValidationError;

/// Failure talking to the remote document store or blob service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The store refused the write as malformed.
    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("upload {upload_id} interrupted after {committed} bytes: {reason}")]
    UploadInterrupted {
        upload_id: String,
        committed: u64,
        reason: String,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::InvalidResponse(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Error returned by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{action} requires an administrator session")]
    AuthorizationDenial { action: &'static str },

    #[error("invalid import file: {0}")]
    ImportFormat(String),
}

impl From<reelrack_engine::Error> for CatalogError {
    fn from(e: reelrack_engine::Error) -> Self {
        match e {
            reelrack_engine::Error::Validation(v) => CatalogError::Validation(v),
            reelrack_engine::Error::ImportFormat(msg) => CatalogError::ImportFormat(msg),
            other => CatalogError::Transport(TransportError::Rejected(other.to_string())),
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_taxonomy() {
        let err: CatalogError = reelrack_engine::Error::Validation(ValidationError::EmptyTitle).into();
        assert!(matches!(err, CatalogError::Validation(ValidationError::EmptyTitle)));

        let err: CatalogError = reelrack_engine::Error::ImportFormat("bad".into()).into();
        assert!(matches!(err, CatalogError::ImportFormat(m) if m == "bad"));

        let err: CatalogError = reelrack_engine::Error::RecordAlreadyExists("t-1".into()).into();
        assert!(matches!(
            err,
            CatalogError::Transport(TransportError::Rejected(_))
        ));
    }

    #[test]
    fn messages() {
        let err = CatalogError::AuthorizationDenial { action: "delete" };
        assert_eq!(err.to_string(), "delete requires an administrator session");

        let err = TransportError::UploadInterrupted {
            upload_id: "u-1".into(),
            committed: 512,
            reason: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "upload u-1 interrupted after 512 bytes: connection reset"
        );
    }
}
