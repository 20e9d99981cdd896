//! Result store abstraction for docsift.
//!
//! The [`ResultStore`] trait is the persistence contract the analysis
//! pipeline is written against: idempotent lookup and save of analysis
//! results, the comparison corpus, and word-cloud blobs. Backends are
//! chosen at construction time (SQLite in the app crate, [`memory`] here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::models::{AnalysisResult, CorpusDocument};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_by_doc_id`](ResultStore::get_by_doc_id) | Look up the stored analysis of a document |
/// | [`save`](ResultStore::save) | Persist a new analysis; unique on `doc_id` |
/// | [`corpus_except`](ResultStore::corpus_except) | All comparison candidates but one |
/// | [`index_document`](ResultStore::index_document) | Insert or replace a corpus entry |
/// | [`save_blob`](ResultStore::save_blob) | Store an image payload, returning its reference |
/// | [`get_blob`](ResultStore::get_blob) | Fetch an image payload by reference |
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Absence is `Ok(None)`, not an error.
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<AnalysisResult>, StoreError>;

    /// Persist a result.
    ///
    /// Must fail with [`StoreError::Conflict`] if a result for the same
    /// `doc_id` already exists, so callers can tell a lost race apart from
    /// a broken backend.
    async fn save(&self, result: &AnalysisResult) -> Result<(), StoreError>;

    /// Every corpus document other than `doc_id`, in no particular order.
    async fn corpus_except(&self, doc_id: &str) -> Result<Vec<CorpusDocument>, StoreError>;

    async fn index_document(&self, doc: &CorpusDocument) -> Result<(), StoreError>;

    /// Store a payload and return its content-addressed reference.
    ///
    /// Saving identical bytes twice returns the same reference.
    async fn save_blob(&self, bytes: &[u8]) -> Result<String, StoreError>;

    /// Fails with [`StoreError::NotFound`] for an unknown reference.
    async fn get_blob(&self, blob_ref: &str) -> Result<Vec<u8>, StoreError>;
}

/// Content-addressed reference for a blob: lowercase hex SHA-256.
pub fn blob_ref(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
