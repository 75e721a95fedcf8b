//! HTTP client for the assistant backend's request/response endpoints.
//!
//! Every method issues exactly one request. Nothing is retried: a failure is
//! returned to the caller, which decides whether it is shown to the user or
//! only logged.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{
    AgentsResponse, AwsStatus, DeleteResponse, DocumentFilter, DocumentType, DocumentsResponse,
    HealthResponse, HistoryResponse, KnowledgeDocument, KnowledgeStats, MemoriesResponse,
    MemoryEntry, HistoryEntry, ReindexResponse, SearchResponse, UploadResponse,
};

/// A document to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub path: &'a Path,
    pub document_type: DocumentType,
    pub category: &'a str,
}

/// Search parameters for `/knowledge/search`.
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    pub query: &'a str,
    pub limit: u32,
    pub similarity_threshold: f64,
}

/// HTTP client for the assistant backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.api_base(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stored turns for a session.
    pub async fn session_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>> {
        let path = format!("/sessions/{}/history", urlencoding::encode(session_id));
        let response: HistoryResponse = self.get_json(&path).await?;
        Ok(response.messages)
    }

    /// Long-term memories recorded for a user.
    pub async fn user_memories(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        let path = format!("/users/{}/memories", urlencoding::encode(user_id));
        let response: MemoriesResponse = self.get_json(&path).await?;
        Ok(response.memories)
    }

    /// Documents in the knowledge base, optionally filtered.
    pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<KnowledgeDocument>> {
        let mut params = Vec::new();
        if let Some(category) = &filter.category {
            params.push(format!("category={}", urlencoding::encode(category)));
        }
        if let Some(document_type) = filter.document_type {
            params.push(format!("document_type={}", document_type.as_str()));
        }
        let path = if params.is_empty() {
            "/knowledge/documents".to_string()
        } else {
            format!("/knowledge/documents?{}", params.join("&"))
        };
        let response: DocumentsResponse = self.get_json(&path).await?;
        Ok(response.documents)
    }

    pub async fn knowledge_stats(&self) -> Result<KnowledgeStats> {
        self.get_json("/knowledge/stats").await
    }

    pub async fn aws_status(&self) -> Result<AwsStatus> {
        self.get_json("/aws/status").await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/health").await
    }

    pub async fn agents(&self) -> Result<AgentsResponse> {
        self.get_json("/agents").await
    }

    /// Upload a file as multipart form data.
    ///
    /// The extension is checked against the document type before anything
    /// is read or sent.
    pub async fn upload_document(&self, request: &UploadRequest<'_>) -> Result<UploadResponse> {
        request.document_type.check_file(request.path)?;

        let file_name = request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("not a file path: {}", request.path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(request.path).await?;

        tracing::debug!(
            file = %file_name,
            size = bytes.len(),
            document_type = request.document_type.as_str(),
            "Uploading document"
        );

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("document_type", request.document_type.as_str())
            .text("category", request.category.to_string());

        let response = self
            .http_client
            .post(self.url("/knowledge/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::parse(response).await
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<DeleteResponse> {
        let path = format!("/knowledge/documents/{}", urlencoding::encode(document_id));
        let response = self
            .http_client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::parse(response).await
    }

    /// Semantic search over the knowledge base.
    ///
    /// Issued as `GET` with query parameters. Backends that only route `POST`
    /// for this path answer 405; the same query string is then sent as a
    /// `POST`, which is how those backends bind scalar parameters.
    pub async fn search(&self, query: &SearchQuery<'_>) -> Result<SearchResponse> {
        let path = format!(
            "/knowledge/search?query={}&limit={}&similarity_threshold={}",
            urlencoding::encode(query.query),
            query.limit,
            query.similarity_threshold
        );
        match self.get_json(&path).await {
            Err(Error::Api { status: 405, .. }) => {
                tracing::debug!("Search GET not allowed, retrying as POST");
                let response = self
                    .http_client
                    .post(self.url(&path))
                    .send()
                    .await
                    .map_err(|e| Error::Http(e.to_string()))?;
                Self::parse(response).await
            }
            other => other,
        }
    }

    pub async fn reindex(&self) -> Result<ReindexResponse> {
        let response = self
            .http_client
            .post(self.url("/knowledge/reindex"))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::parse(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Http(format!("failed to parse response: {}", e)))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api {
                status: status.as_u16(),
                body: api_error_detail(&body),
            })
        }
    }
}

/// Pull `detail` out of a JSON error body, or return the body as is.
fn api_error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
