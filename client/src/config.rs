//! Configuration for the client core.

use std::env;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the catalog API, without a trailing slash
    pub api_url: String,
    /// Uid granted the admin capability
    pub admin_uid: Option<String>,
    /// Interval between snapshot polls
    pub poll_interval: Duration,
    /// Bytes sent per upload chunk
    pub upload_chunk_bytes: usize,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the API URL.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            admin_uid: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
            auth_token: None,
        }
    }

    /// Load configuration from the process environment and a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("REELRACK_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        let mut config = Self::new(api_url.trim());

        config.admin_uid = lookup("REELRACK_ADMIN_UID").filter(|uid| !uid.is_empty());
        config.auth_token = lookup("REELRACK_AUTH_TOKEN").filter(|token| !token.is_empty());

        if let Some(raw) = lookup("REELRACK_POLL_INTERVAL_MS") {
            let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidPollInterval)?;
            if millis == 0 {
                return Err(ConfigError::InvalidPollInterval);
            }
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("REELRACK_UPLOAD_CHUNK_BYTES") {
            let bytes: usize = raw.parse().map_err(|_| ConfigError::InvalidChunkSize)?;
            if bytes == 0 {
                return Err(ConfigError::InvalidChunkSize);
            }
            config.upload_chunk_bytes = bytes;
        }

        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REELRACK_API_URL environment variable is required")]
    MissingApiUrl,

    #[error("Invalid REELRACK_POLL_INTERVAL_MS value")]
    InvalidPollInterval,

    #[error("Invalid REELRACK_UPLOAD_CHUNK_BYTES value")]
    InvalidChunkSize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("REELRACK_API_URL", "http://localhost:3000/")]))
                .unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.upload_chunk_bytes, 256 * 1024);
        assert_eq!(config.admin_uid, None);
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("REELRACK_API_URL", "https://api.example.com"),
            ("REELRACK_ADMIN_UID", "admin-1"),
            ("REELRACK_POLL_INTERVAL_MS", "500"),
            ("REELRACK_UPLOAD_CHUNK_BYTES", "1024"),
            ("REELRACK_AUTH_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.admin_uid.as_deref(), Some("admin-1"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.upload_chunk_bytes, 1024);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiUrl)
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                ("REELRACK_API_URL", "http://x"),
                ("REELRACK_POLL_INTERVAL_MS", "soon"),
            ])),
            Err(ConfigError::InvalidPollInterval)
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                ("REELRACK_API_URL", "http://x"),
                ("REELRACK_UPLOAD_CHUNK_BYTES", "0"),
            ])),
            Err(ConfigError::InvalidChunkSize)
        ));
    }
}
