//! HTTP content source backed by the file-storing service.
//!
//! Resolves a document in two requests:
//!
//! 1. `GET {base_url}/files/{doc_id}` → JSON metadata `{id, name, hash, location}`
//! 2. `GET {base_url}/files/content/{location}` → raw text
//!
//! A `404` on either request is [`ContentError::NotFound`]; any other
//! non-success status, transport error, or undecodable body is
//! [`ContentError::Unavailable`]. Requests are bounded by the configured
//! timeout and never retried.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use docsift_core::error::ContentError;
use docsift_core::models::SourceDocument;
use docsift_core::source::ContentSource;

/// File metadata as returned by `GET /files/{id}`.
#[derive(Debug, Deserialize)]
struct FileMetadata {
    #[serde(default)]
    name: String,
    location: String,
}

/// Content source speaking the file-storing service protocol.
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl HttpContentSource {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid source.base_url '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("source.base_url must be an http(s) URL: {}", base_url);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> ContentError {
        if err.is_timeout() {
            ContentError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ContentError::Unavailable(err.to_string())
        }
    }

    async fn get(&self, url: Url, doc_id: &str) -> Result<reqwest::Response, ContentError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ContentError::NotFound {
                doc_id: doc_id.to_string(),
            }),
            status => Err(ContentError::Unavailable(format!(
                "GET {} returned {}",
                url, status
            ))),
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, ContentError> {
        let metadata: FileMetadata = self
            .get(self.url(&["files", doc_id]), doc_id)
            .await?
            .json()
            .await
            .map_err(|e| ContentError::Unavailable(format!("invalid file metadata: {}", e)))?;

        let content = self
            .get(self.url(&["files", "content", &metadata.location]), doc_id)
            .await?
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let display_name = if metadata.name.is_empty() {
            doc_id.to_string()
        } else {
            metadata.name
        };

        Ok(SourceDocument {
            doc_id: doc_id.to_string(),
            display_name,
            content,
        })
    }
}
