//! Word-cloud rendering abstraction.
//!
//! Defines the [`WordCloudRenderer`] trait implemented by rendering
//! backends, plus [`DisabledRenderer`] for deployments without one.
//! The requester that bounds the call with a timeout and stores the
//! resulting image lives in the `docsift` app crate.

use async_trait::async_trait;

use crate::error::WordCloudError;

/// Renders normalized text into an image payload.
#[async_trait]
pub trait WordCloudRenderer: Send + Sync {
    /// Short identifier used in logs (e.g. `"http"`, `"disabled"`).
    fn name(&self) -> &str;

    /// Returns the encoded image bytes (PNG).
    async fn render(&self, text: &str) -> Result<Vec<u8>, WordCloudError>;
}

/// A renderer that always fails with [`WordCloudError::Disabled`].
///
/// Used when `wordcloud.provider = "disabled"`. Results analyzed under it
/// carry no `wordCloudRef`.
pub struct DisabledRenderer;

#[async_trait]
impl WordCloudRenderer for DisabledRenderer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn render(&self, _text: &str) -> Result<Vec<u8>, WordCloudError> {
        Err(WordCloudError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_renderer_fails() {
        let err = DisabledRenderer.render("words").await.unwrap_err();
        assert_eq!(err, WordCloudError::Disabled);
    }
}
