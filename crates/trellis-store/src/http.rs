//! HTTP note store client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use trellis_core::{GraphPayload, NewNote, Note, NoteId, NoteSummary};

use crate::error::{StoreError, StoreResult};
use crate::traits::NoteStore;

/// Default API root of a locally running note server
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Note store reached over HTTP + JSON
pub struct HttpStore {
    http: Client,
    base_url: String,
}

impl HttpStore {
    /// Create a client for the given API root
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        tracing::debug!("HTTP store at {} (timeout {:?})", base_url, timeout);
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("{} returned {}", path, status);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(path, response).await
    }
}

#[async_trait]
impl NoteStore for HttpStore {
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        let path = "/notes/search";
        let response = self
            .http
            .get(self.url(path))
            .query(&[("q", query)])
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        let path = format!("/notes/{}", id);
        match self.get(&path).await {
            Err(StoreError::Status { status: 404, .. }) => Err(StoreError::NotFound(id.to_string())),
            other => other,
        }
    }

    async fn create_note(&self, note: NewNote) -> StoreResult<Note> {
        let path = "/notes";
        let response = self.http.post(self.url(path)).json(&note).send().await?;
        Self::decode(path, response).await
    }

    async fn get_graph(&self) -> StoreResult<GraphPayload> {
        self.get("/graph").await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(self.get_graph().await.is_ok())
    }
}
