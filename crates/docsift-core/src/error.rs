//! Error types for the analysis pipeline.
//!
//! Fatal failures surface to the caller as [`AnalyzeError`]. The
//! best-effort steps have their own error types ([`SimilarityError`],
//! [`WordCloudError`]) which the orchestrator logs and discards.

use thiserror::Error;

/// Coarse classification of a fatal error, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request or the document itself cannot be analyzed.
    BadInput,
    /// The document (or blob) does not exist.
    NotFound,
    /// A dependency did not answer in time.
    Timeout,
    /// A dependency failed.
    Unavailable,
}

/// Failures reported by a content source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// The source has no document with this id.
    #[error("document not found: {doc_id}")]
    NotFound {
        /// The requested document id.
        doc_id: String,
    },

    /// The source answered with an error or could not be reached.
    #[error("content source unavailable: {0}")]
    Unavailable(String),

    /// The fetch exceeded its deadline.
    #[error("content fetch timed out after {secs}s")]
    Timeout {
        /// The configured deadline.
        secs: u64,
    },
}

/// Failures reported by a result store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A result for this document already exists.
    #[error("analysis for document {doc_id} already exists")]
    Conflict {
        /// The document id whose uniqueness was violated.
        doc_id: String,
    },

    /// The requested blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Failures of the similarity step. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// The corpus could not be read.
    #[error("failed to read corpus: {0}")]
    Corpus(#[from] StoreError),

    /// The backend exceeded its deadline.
    #[error("similarity backend timed out after {secs}s")]
    Timeout {
        /// The configured deadline.
        secs: u64,
    },

    /// Backend-specific failure.
    #[error("similarity backend failed: {0}")]
    Backend(String),
}

/// Failures of the word-cloud step. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WordCloudError {
    /// No renderer is configured.
    #[error("word cloud rendering is disabled")]
    Disabled,

    /// The renderer exceeded its deadline.
    #[error("word cloud request timed out after {secs}s")]
    Timeout {
        /// The configured deadline.
        secs: u64,
    },

    /// The renderer answered with a non-success status.
    #[error("word cloud renderer returned status {0}")]
    Status(u16),

    /// The request could not be sent or the body could not be read.
    #[error("word cloud request failed: {0}")]
    Request(String),

    /// The renderer returned an empty body.
    #[error("word cloud renderer returned an empty image")]
    EmptyPayload,

    /// The image could not be stored.
    #[error("failed to store word cloud: {0}")]
    Storage(#[from] StoreError),
}

/// Fatal failures of `Analyze`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzeError {
    /// The document id is empty.
    #[error("document id must not be empty")]
    InvalidDocId,

    /// The document content could not be fetched.
    #[error("failed to fetch content for {doc_id}: {source}")]
    ContentFetch {
        /// The document being analyzed.
        doc_id: String,
        /// The underlying source failure.
        #[source]
        source: ContentError,
    },

    /// The document has no analyzable text.
    #[error("document {doc_id} has no analyzable text")]
    EmptyContent {
        /// The document being analyzed.
        doc_id: String,
    },

    /// Reading or persisting the result failed.
    #[error("result store failure: {0}")]
    Storage(#[from] StoreError),
}

impl AnalyzeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDocId | Self::EmptyContent { .. } => ErrorKind::BadInput,
            Self::ContentFetch { source, .. } => match source {
                ContentError::NotFound { .. } => ErrorKind::NotFound,
                ContentError::Timeout { .. } => ErrorKind::Timeout,
                ContentError::Unavailable(_) => ErrorKind::Unavailable,
            },
            Self::Storage(_) => ErrorKind::Unavailable,
        }
    }
}
