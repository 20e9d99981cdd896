//! The analysis orchestrator.
//!
//! [`Analyzer::analyze`] turns a document id into its canonical
//! [`AnalysisResult`], computing it at most once:
//!
//! ```text
//! stored? ──yes──▶ return it
//!    │ no
//!    ▼
//! per-doc lock ─▶ stored? ──yes──▶ return it
//!    │ no
//!    ▼
//! fetch ─▶ metrics ─▶ similarity* ─▶ word cloud* ─▶ save ─▶ index corpus*
//! ```
//!
//! Steps marked `*` are best-effort: their failures are logged at `warn`
//! and the pipeline continues. Fetch, empty content and storage failures
//! abort with an [`AnalyzeError`] and nothing is persisted.
//!
//! # Duplicate requests
//!
//! Concurrent calls for the same id inside one process are serialized by
//! a per-id lock; the winner computes, the rest find its stored result.
//! Across processes sharing one database the store's uniqueness check
//! decides: the loser of a save race discards its own result and returns
//! the stored one.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use docsift_core::error::{AnalyzeError, ContentError, StoreError};
use docsift_core::metrics::TextMetrics;
use docsift_core::models::{AnalysisResult, CorpusDocument, SimilarFile, SourceDocument};
use docsift_core::similarity::{normalize, SimilarityBackend};
use docsift_core::source::ContentSource;
use docsift_core::store::ResultStore;
use docsift_core::wordcloud::WordCloudRenderer;

use crate::config::Config;
use crate::similarity::CorpusScan;
use crate::singleflight::KeyedLocks;
use crate::sources::create_source;
use crate::wordcloud::{create_renderer, WordCloudRequester};

/// Deadlines and switches for one [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub fetch_timeout: Duration,
    pub similarity_timeout: Duration,
    pub wordcloud_timeout: Duration,
    /// Upsert each analyzed document into the comparison corpus.
    pub index_on_analyze: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            similarity_timeout: Duration::from_secs(5),
            wordcloud_timeout: Duration::from_secs(10),
            index_on_analyze: true,
        }
    }
}

impl AnalyzerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: config.source_timeout(),
            similarity_timeout: Duration::from_secs(config.similarity.timeout_secs),
            wordcloud_timeout: Duration::from_secs(config.wordcloud.timeout_secs),
            index_on_analyze: config.corpus.index_on_analyze,
        }
    }
}

pub struct Analyzer {
    store: Arc<dyn ResultStore>,
    source: Arc<dyn ContentSource>,
    similarity: Arc<dyn SimilarityBackend>,
    wordcloud: WordCloudRequester,
    options: AnalyzerOptions,
    in_flight: Arc<KeyedLocks>,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn ResultStore>,
        source: Arc<dyn ContentSource>,
        similarity: Arc<dyn SimilarityBackend>,
        renderer: Arc<dyn WordCloudRenderer>,
        options: AnalyzerOptions,
    ) -> Self {
        let wordcloud =
            WordCloudRequester::new(renderer, Arc::clone(&store), options.wordcloud_timeout);
        Self {
            store,
            source,
            similarity,
            wordcloud,
            options,
            in_flight: Arc::new(KeyedLocks::new()),
        }
    }

    /// Wire up the configured source, corpus scan and renderer around `store`.
    pub fn from_config(config: &Config, store: Arc<dyn ResultStore>) -> Result<Self> {
        let source = create_source(config)?;
        let similarity = Arc::new(CorpusScan::new(
            Arc::clone(&store),
            config.similarity.params(),
        ));
        let renderer = create_renderer(&config.wordcloud)?;

        Ok(Self::new(
            store,
            source,
            similarity,
            renderer,
            AnalyzerOptions::from_config(config),
        ))
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// The stored analysis of `doc_id`, without computing anything.
    pub async fn stored(&self, doc_id: &str) -> Result<Option<AnalysisResult>, AnalyzeError> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return Err(AnalyzeError::InvalidDocId);
        }
        Ok(self.store.get_by_doc_id(doc_id).await?)
    }

    /// Return the canonical analysis of `doc_id`, computing and persisting
    /// it if this is the first request.
    #[tracing::instrument(skip(self))]
    pub async fn analyze(&self, doc_id: &str) -> Result<AnalysisResult, AnalyzeError> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return Err(AnalyzeError::InvalidDocId);
        }

        if let Some(existing) = self.store.get_by_doc_id(doc_id).await? {
            tracing::debug!(id = %existing.id, "returning stored analysis");
            return Ok(existing);
        }

        let _guard = self.in_flight.acquire(doc_id).await;

        // Whoever held the lock before us may have just stored it.
        if let Some(existing) = self.store.get_by_doc_id(doc_id).await? {
            tracing::debug!(id = %existing.id, "analysis completed by concurrent request");
            return Ok(existing);
        }

        let document = self.fetch(doc_id).await?;
        if document.content.trim().is_empty() {
            return Err(AnalyzeError::EmptyContent {
                doc_id: doc_id.to_string(),
            });
        }

        let metrics = TextMetrics::compute(&document.content);
        let similar_matches = self.find_similar(doc_id, &document.content).await;
        let word_cloud_ref = if !normalize(&document.content).is_empty() {
            self.word_cloud(&document.content).await
        } else {
            None
        };

        let result = AnalysisResult::new(doc_id, metrics, similar_matches, word_cloud_ref);
        let stored = self.persist(result).await?;

        if self.options.index_on_analyze {
            self.index(document).await;
        }

        tracing::info!(
            id = %stored.id,
            words = stored.words,
            matches = stored.similar_matches.len(),
            plagiarism_score = stored.plagiarism_score,
            "analysis stored"
        );
        Ok(stored)
    }

    async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, AnalyzeError> {
        let timeout = self.options.fetch_timeout;
        let outcome = tokio::time::timeout(timeout, self.source.fetch(doc_id))
            .await
            .unwrap_or(Err(ContentError::Timeout {
                secs: timeout.as_secs(),
            }));

        outcome.map_err(|source| AnalyzeError::ContentFetch {
            doc_id: doc_id.to_string(),
            source,
        })
    }

    async fn find_similar(&self, doc_id: &str, text: &str) -> Vec<SimilarFile> {
        let timeout = self.options.similarity_timeout;
        match tokio::time::timeout(timeout, self.similarity.find_similar(doc_id, text)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(
                    backend = self.similarity.name(),
                    error = %e,
                    "similarity failed, continuing without matches"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.similarity.name(),
                    timeout_secs = timeout.as_secs(),
                    "similarity timed out, continuing without matches"
                );
                Vec::new()
            }
        }
    }

    async fn word_cloud(&self, text: &str) -> Option<String> {
        match self.wordcloud.request(text).await {
            Ok(blob_ref) => Some(blob_ref),
            Err(e) => {
                tracing::warn!(
                    renderer = self.wordcloud.renderer_name(),
                    error = %e,
                    "word cloud unavailable"
                );
                None
            }
        }
    }

    async fn persist(&self, result: AnalysisResult) -> Result<AnalysisResult, AnalyzeError> {
        match self.store.save(&result).await {
            Ok(()) => Ok(result),
            Err(StoreError::Conflict { .. }) => {
                tracing::info!(
                    discarded = %result.id,
                    "result already stored by another writer, returning it"
                );
                self.store
                    .get_by_doc_id(&result.doc_id)
                    .await?
                    .ok_or_else(|| {
                        AnalyzeError::Storage(StoreError::Backend(format!(
                            "conflicting result for {} could not be read back",
                            result.doc_id
                        )))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn index(&self, document: SourceDocument) {
        let doc = CorpusDocument::from(document);
        if let Err(e) = self.store.index_document(&doc).await {
            tracing::warn!(error = %e, "failed to add document to corpus");
        }
    }
}
