//! Document store over the `/titles` API.

use super::ApiClient;
use crate::error::TransportError;
use crate::remote::{DocumentStore, StoredRecord};
use async_trait::async_trait;
use reelrack_engine::{CatalogRecord, NewRecord, RecordPatch, WriteOutcome};
use reqwest::{Method, StatusCode};

/// [`DocumentStore`] backed by the ReelRack server.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    api: ApiClient,
}

impl HttpDocumentStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self) -> Result<Vec<CatalogRecord>, TransportError> {
        let request = self.api.request(Method::GET, &["titles"])?;
        Ok(self.api.send(request).await?.json().await?)
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>, TransportError> {
        let request = self.api.request(Method::GET, &["titles", id])?;
        match self.api.send(request).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(TransportError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, record: NewRecord) -> Result<CatalogRecord, TransportError> {
        tracing::debug!(record_id = %record.id, "POST /titles");
        let request = self.api.request(Method::POST, &["titles"])?.json(&record);
        Ok(self.api.send(request).await?.json().await?)
    }

    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<StoredRecord, TransportError> {
        tracing::debug!(record_id = %id, "PATCH /titles/{{id}}");
        let request = self
            .api
            .request(Method::PATCH, &["titles", id])?
            .json(&patch);
        let response = self.api.send(request).await?;
        let outcome = if response.status() == StatusCode::CREATED {
            WriteOutcome::Created
        } else {
            WriteOutcome::Updated
        };
        Ok(StoredRecord {
            record: response.json().await?,
            outcome,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), TransportError> {
        tracing::debug!(record_id = %id, "DELETE /titles/{{id}}");
        let request = self.api.request(Method::DELETE, &["titles", id])?;
        self.api.send(request).await?;
        Ok(())
    }
}
