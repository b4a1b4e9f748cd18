//! Resumable chunked uploads against the blob service.
//!
//! A session is opened with `POST /uploads`, chunks are appended with
//! `PUT /uploads/{id}` at the committed offset, and `POST
//! /uploads/{id}/complete` makes the object durable and yields its URL.

use super::ApiClient;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::upload::{AssetBlob, AssetPath, AssetUploader, ProgressFn, ProgressTracker, RetrievalUrl};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Header carrying the byte offset a chunk starts at.
pub const UPLOAD_OFFSET_HEADER: &str = "Upload-Offset";

const DEFAULT_CHUNK_BYTES: usize = 256 * 1024;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenUpload<'a> {
    path: &'a str,
    content_type: &'a str,
    total_bytes: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadOpened {
    upload_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadStatus {
    committed: u64,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct UploadCompleted {
    url: String,
}

/// [`AssetUploader`] speaking the server's upload session protocol.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    api: ApiClient,
    chunk_bytes: usize,
}

impl HttpUploader {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    /// Uploader for the configured API, sending `REELRACK_UPLOAD_CHUNK_BYTES` per chunk.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(ApiClient::from_config(config)?).with_chunk_bytes(config.upload_chunk_bytes))
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Continue an interrupted upload from the offset the server committed.
    pub async fn resume(
        &self,
        upload_id: &str,
        blob: &AssetBlob,
        progress: &ProgressFn<'_>,
    ) -> Result<RetrievalUrl, TransportError> {
        let request = self.api.request(Method::GET, &["uploads", upload_id])?;
        let status: UploadStatus = self.api.send(request).await?.json().await?;
        if status.total != blob.len() {
            return Err(TransportError::Conflict(format!(
                "upload {upload_id} expects {} bytes, blob has {}",
                status.total,
                blob.len()
            )));
        }

        tracing::info!(upload_id, committed = status.committed, "resuming upload");
        let mut tracker = ProgressTracker::new(progress, blob.len());
        self.transfer(upload_id, blob, status.committed, &mut tracker)
            .await
    }

    async fn transfer(
        &self,
        upload_id: &str,
        blob: &AssetBlob,
        mut committed: u64,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<RetrievalUrl, TransportError> {
        tracker.report(committed);

        while committed < blob.len() {
            let start = committed as usize;
            let end = (start + self.chunk_bytes).min(blob.bytes.len());
            let chunk = blob.bytes.slice(start..end);

            let request = self
                .api
                .request(Method::PUT, &["uploads", upload_id])?
                .header(UPLOAD_OFFSET_HEADER, committed.to_string())
                .body(chunk);
            let status: UploadStatus = match self.api.send(request).await {
                Ok(response) => response.json().await?,
                Err(e) => {
                    return Err(TransportError::UploadInterrupted {
                        upload_id: upload_id.to_string(),
                        committed,
                        reason: e.to_string(),
                    })
                }
            };

            if status.committed <= committed {
                return Err(TransportError::InvalidResponse(format!(
                    "upload {upload_id} did not advance past {committed}"
                )));
            }
            committed = status.committed;
            tracker.report(committed);
        }

        let request = self
            .api
            .request(Method::POST, &["uploads", upload_id, "complete"])?;
        let completed: UploadCompleted = self.api.send(request).await?.json().await?;
        tracker.finish();

        tracing::debug!(upload_id, url = %completed.url, "upload completed");
        Ok(completed.url)
    }
}

#[async_trait]
impl AssetUploader for HttpUploader {
    async fn upload(
        &self,
        blob: &AssetBlob,
        path: &AssetPath,
        progress: &ProgressFn<'_>,
    ) -> Result<RetrievalUrl, TransportError> {
        let open = OpenUpload {
            path: path.as_str(),
            content_type: blob.content_type(),
            total_bytes: blob.len(),
        };
        let request = self.api.request(Method::POST, &["uploads"])?.json(&open);
        let opened: UploadOpened = self.api.send(request).await?.json().await?;

        tracing::info!(upload_id = %opened.upload_id, path = %path, bytes = blob.len(), "upload started");
        let mut tracker = ProgressTracker::new(progress, blob.len());
        self.transfer(&opened.upload_id, blob, 0, &mut tracker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_comes_from_config() {
        let mut config = ClientConfig::new("http://localhost:3000");
        assert_eq!(
            HttpUploader::from_config(&config).unwrap().chunk_bytes(),
            DEFAULT_CHUNK_BYTES
        );

        config.upload_chunk_bytes = 1024;
        assert_eq!(HttpUploader::from_config(&config).unwrap().chunk_bytes(), 1024);

        config.api_url = "not a url".into();
        assert!(HttpUploader::from_config(&config).is_err());
    }
}
