//! HTTP implementations of the remote seams, against the ReelRack server API.

mod mirror;
mod store;
mod upload;

pub use mirror::PollingMirror;
pub use store::HttpDocumentStore;
pub use upload::HttpUploader;

use crate::config::ClientConfig;
use crate::error::TransportError;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Thin wrapper over a `reqwest::Client` bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::Network(format!("invalid API URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Network(format!(
                "invalid API URL {base_url}: not a base URL"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            auth_token: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut client = Self::new(&config.api_url)?;
        client.auth_token = config.auth_token.clone();
        Ok(client)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// URL for a path given as unescaped segments.
    pub fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                TransportError::Network(format!("invalid API URL {}", self.base_url))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Start a request, with the bearer token attached if configured.
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, TransportError> {
        let mut builder = self.http.request(method, self.url(segments)?);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send a request, turning non-success statuses into errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let response = builder.send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{error}: {details}"),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if text.is_empty() => status.to_string(),
        Err(_) => text,
    };

    Err(match status {
        StatusCode::NOT_FOUND => TransportError::NotFound(message),
        StatusCode::CONFLICT => TransportError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TransportError::PermissionDenied(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            TransportError::Rejected(message)
        }
        other => TransportError::Status {
            status: other.as_u16(),
            message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_escape_segments() {
        let client = ApiClient::new("http://localhost:3000/api/").unwrap();
        assert_eq!(
            client.url(&["titles", "a b/c"]).unwrap().as_str(),
            "http://localhost:3000/api/titles/a%20b%2Fc"
        );

        let client = ApiClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.url(&["uploads", "u-1", "complete"]).unwrap().as_str(),
            "http://localhost:3000/uploads/u-1/complete"
        );
    }

    #[test]
    fn rejects_bad_base() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:someone@example.com").is_err());
    }
}
