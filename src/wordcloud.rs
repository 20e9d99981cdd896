//! Word-cloud rendering over HTTP and the best-effort requester.
//!
//! - **[`HttpWordCloudRenderer`]** posts the text to a rendering service and
//!   takes the response body as the PNG image.
//! - **[`WordCloudRequester`]** normalizes the text, bounds the render call
//!   with a timeout, and stores the image through the result store's blob
//!   interface, returning only the blob reference.
//!
//! # Request Body
//!
//! ```json
//! {
//!   "text": "normalized document text",
//!   "width": 800,
//!   "height": 600,
//!   "format": "png",
//!   "removeStopwords": true,
//!   "caseSensitive": false,
//!   "maxNumWords": 100
//! }
//! ```
//!
//! Every failure is reported as a [`WordCloudError`]; the analyzer treats
//! all of them as "no image" and never retries.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use docsift_core::error::WordCloudError;
use docsift_core::similarity::normalize;
use docsift_core::store::ResultStore;
use docsift_core::wordcloud::{DisabledRenderer, WordCloudRenderer};

use crate::config::WordCloudConfig;

/// Instantiate the renderer named by `wordcloud.provider`.
pub fn create_renderer(config: &WordCloudConfig) -> Result<Arc<dyn WordCloudRenderer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledRenderer)),
        "http" => Ok(Arc::new(HttpWordCloudRenderer::new(config)?)),
        other => anyhow::bail!("Unknown wordcloud provider: {}", other),
    }
}

/// Renderer backed by an HTTP word-cloud service.
pub struct HttpWordCloudRenderer {
    client: reqwest::Client,
    url: String,
    width: u32,
    height: u32,
    max_words: u32,
    timeout_secs: u64,
}

impl HttpWordCloudRenderer {
    pub fn new(config: &WordCloudConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("wordcloud.url required for http provider"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            width: config.width,
            height: config.height,
            max_words: config.max_words,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl WordCloudRenderer for HttpWordCloudRenderer {
    fn name(&self) -> &str {
        "http"
    }

    async fn render(&self, text: &str) -> Result<Vec<u8>, WordCloudError> {
        let body = serde_json::json!({
            "text": text,
            "width": self.width,
            "height": self.height,
            "format": "png",
            "removeStopwords": true,
            "caseSensitive": false,
            "maxNumWords": self.max_words,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WordCloudError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    WordCloudError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordCloudError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WordCloudError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Best-effort word-cloud generation: render, store, return the reference.
pub struct WordCloudRequester {
    renderer: Arc<dyn WordCloudRenderer>,
    store: Arc<dyn ResultStore>,
    timeout: Duration,
}

impl WordCloudRequester {
    pub fn new(
        renderer: Arc<dyn WordCloudRenderer>,
        store: Arc<dyn ResultStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            renderer,
            store,
            timeout,
        }
    }

    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }

    /// Render `text` and store the image. Only the reference is returned.
    pub async fn request(&self, text: &str) -> Result<String, WordCloudError> {
        let normalized = normalize(text);

        let image = tokio::time::timeout(self.timeout, self.renderer.render(&normalized))
            .await
            .map_err(|_| WordCloudError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if image.is_empty() {
            return Err(WordCloudError::EmptyPayload);
        }

        Ok(self.store.save_blob(&image).await?)
    }
}
