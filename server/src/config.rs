//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::blobs::UploadLimits;

const DEFAULT_MAX_CHUNK_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 512 * 1024 * 1024;
const DEFAULT_UPLOAD_TTL_SECS: u64 = 60 * 60;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; titles are kept in memory when absent
    pub database_url: Option<String>,
    /// Directory completed uploads are written to
    pub blob_dir: PathBuf,
    /// Base of the retrieval URLs handed out for blobs
    pub public_url: String,
    /// Largest chunk accepted by `PUT /uploads/{id}`
    pub max_chunk_bytes: usize,
    /// Largest object an upload session may declare
    pub max_upload_bytes: u64,
    /// Idle time after which an unfinished upload session is dropped
    pub upload_ttl: Duration,
    /// Bearer token required on mutating routes
    pub auth_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let blob_dir = lookup("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./blobs"));

        let public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let max_chunk_bytes = match lookup("MAX_CHUNK_BYTES") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or(ConfigError::InvalidMaxChunkBytes)?,
            None => DEFAULT_MAX_CHUNK_BYTES,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .ok_or(ConfigError::InvalidMaxUploadBytes)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let upload_ttl = match lookup("UPLOAD_TTL_SECS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidUploadTtl)?,
            None => Duration::from_secs(DEFAULT_UPLOAD_TTL_SECS),
        };

        let auth_secret = lookup("AUTH_SECRET").filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            blob_dir,
            public_url,
            max_chunk_bytes,
            max_upload_bytes,
            upload_ttl,
            auth_secret,
        })
    }

    /// In-memory configuration rooted at a blob directory, for tests and demos.
    pub fn local(blob_dir: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            blob_dir: blob_dir.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_ttl: Duration::from_secs(DEFAULT_UPLOAD_TTL_SECS),
            auth_secret: None,
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_chunk_bytes: self.max_chunk_bytes,
            max_object_bytes: self.max_upload_bytes,
            session_ttl: self.upload_ttl,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid MAX_CHUNK_BYTES value")]
    InvalidMaxChunkBytes,

    #[error("Invalid MAX_UPLOAD_BYTES value")]
    InvalidMaxUploadBytes,

    #[error("Invalid UPLOAD_TTL_SECS value")]
    InvalidUploadTtl,
}
