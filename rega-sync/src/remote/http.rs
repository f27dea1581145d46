//! HTTP document store client.
//!
//! Speaks the hub's REST API:
//! - `GET  /v1/{collection}` (optionally `?field=F&equals=<json>`)
//! - `GET  /v1/{collection}/{id}`
//! - `POST /v1/{collection}`
//! - `PATCH /v1/{collection}/{id}`

use super::DocumentStore;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use rega_types::Document;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Connection settings for the remote document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpStoreConfig {
    /// Base URL of the hub (e.g. `http://127.0.0.1:8787`).
    pub base_url: String,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
    /// Bearer token sent with every request, if any.
    pub token: Option<String>,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Inserted {
    id: String,
}

/// [`DocumentStore`] backed by the hub's HTTP API.
pub struct HttpDocumentStore {
    config: HttpStoreConfig,
    client: Client,
}

impl HttpDocumentStore {
    pub fn new(config: HttpStoreConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &HttpStoreConfig {
        &self.config
    }

    fn url(&self, collection: &str, id: Option<&str>) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match id {
            Some(id) => format!("{base}/v1/{collection}/{id}"),
            None => format!("{base}/v1/{collection}"),
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> SyncResult<Response> {
        let request = match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{what} failed: {e}")))
    }

    /// Turns a non-success response into a per-request rejection.
    async fn check(response: Response, what: &str) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Remote(format!("{what} returned {status}: {body}")))
    }

    async fn documents(&self, request: RequestBuilder, what: &str) -> SyncResult<Vec<Document>> {
        let response = Self::check(self.send(request, what).await?, what).await?;
        let list: DocumentList = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(format!("failed to parse {what} response: {e}")))?;
        Ok(list.documents)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn query(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> SyncResult<Vec<Document>> {
        let equals = serde_json::to_string(equals)?;
        let request = self
            .client
            .get(self.url(collection, None))
            .query(&[("field", field), ("equals", equals.as_str())]);
        let docs = self.documents(request, "query").await?;
        debug!("Query {collection}.{field} matched {} documents", docs.len());
        Ok(docs)
    }

    async fn insert(&self, collection: &str, data: Value) -> SyncResult<String> {
        let request = self.client.post(self.url(collection, None)).json(&data);
        let response = Self::check(self.send(request, "insert").await?, "insert").await?;
        let inserted: Inserted = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(format!("failed to parse insert response: {e}")))?;
        debug!("Inserted {collection}/{}", inserted.id);
        Ok(inserted.id)
    }

    async fn get_all(&self, collection: &str) -> SyncResult<Vec<Document>> {
        let request = self.client.get(self.url(collection, None));
        self.documents(request, "list").await
    }

    async fn get(&self, collection: &str, id: &str) -> SyncResult<Option<Document>> {
        let request = self.client.get(self.url(collection, Some(id)));
        let response = self.send(request, "get").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response, "get").await?;
        let doc = response
            .json()
            .await
            .map_err(|e| SyncError::Remote(format!("failed to parse document: {e}")))?;
        Ok(Some(doc))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> SyncResult<()> {
        let request = self
            .client
            .patch(self.url(collection, Some(id)))
            .json(&patch);
        Self::check(self.send(request, "update").await?, "update").await?;
        debug!("Updated {collection}/{id}");
        Ok(())
    }
}
