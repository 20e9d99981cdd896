//! Content source abstraction.
//!
//! A [`ContentSource`] turns a document id into the document's full text.
//! It is the boundary to whatever owns the raw files: the file-storing
//! service over HTTP, or a local directory. Concrete implementations live
//! in the `docsift` app crate.

use async_trait::async_trait;

use crate::error::ContentError;
use crate::models::SourceDocument;

/// Fetches document text by id.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use docsift_core::error::ContentError;
/// use docsift_core::models::SourceDocument;
/// use docsift_core::source::ContentSource;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl ContentSource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///
///     async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, ContentError> {
///         Ok(SourceDocument {
///             doc_id: doc_id.to_string(),
///             display_name: format!("{doc_id}.txt"),
///             content: "hello".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short identifier used in logs (e.g. `"http"`, `"filesystem"`).
    fn name(&self) -> &str;

    /// Fetch the document. An unknown id is [`ContentError::NotFound`].
    async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, ContentError>;
}
