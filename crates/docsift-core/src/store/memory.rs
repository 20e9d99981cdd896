//! In-memory [`ResultStore`] implementation for testing and single-process use.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Uniqueness on `doc_id` is
//! checked and applied under one write lock, so concurrent saves of the
//! same document resolve to exactly one winner and [`StoreError::Conflict`]
//! for the rest.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{AnalysisResult, CorpusDocument};

use super::{blob_ref, ResultStore};

/// In-memory store.
pub struct InMemoryStore {
    results: RwLock<HashMap<String, AnalysisResult>>,
    corpus: RwLock<HashMap<String, CorpusDocument>>,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
            corpus: RwLock::new(HashMap::new()),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store whose corpus is pre-populated with `docs`.
    pub fn with_corpus(docs: impl IntoIterator<Item = CorpusDocument>) -> Self {
        let store = Self::new();
        {
            let mut corpus = write(&store.corpus);
            for doc in docs {
                corpus.insert(doc.doc_id.clone(), doc);
            }
        }
        store
    }

    /// Number of persisted analysis results.
    pub fn result_count(&self) -> usize {
        read(&self.results).len()
    }

    /// Number of stored blobs.
    pub fn blob_count(&self) -> usize {
        read(&self.blobs).len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// No write leaves a map half-updated, so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        Ok(read(&self.results).get(doc_id).cloned())
    }

    async fn save(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut results = write(&self.results);
        if results.contains_key(&result.doc_id) {
            return Err(StoreError::Conflict {
                doc_id: result.doc_id.clone(),
            });
        }
        results.insert(result.doc_id.clone(), result.clone());
        Ok(())
    }

    async fn corpus_except(&self, doc_id: &str) -> Result<Vec<CorpusDocument>, StoreError> {
        Ok(read(&self.corpus)
            .values()
            .filter(|doc| doc.doc_id != doc_id)
            .cloned()
            .collect())
    }

    async fn index_document(&self, doc: &CorpusDocument) -> Result<(), StoreError> {
        write(&self.corpus).insert(doc.doc_id.clone(), doc.clone());
        Ok(())
    }

    async fn save_blob(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let key = blob_ref(bytes);
        write(&self.blobs)
            .entry(key.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(key)
    }

    async fn get_blob(&self, blob_ref: &str) -> Result<Vec<u8>, StoreError> {
        read(&self.blobs)
            .get(blob_ref)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(blob_ref.to_string()))
    }
}
