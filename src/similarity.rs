//! Corpus-scan similarity backend.
//!
//! Reads the comparison corpus from the [`ResultStore`] and scores it on
//! tokio's blocking pool so a large corpus never stalls a runtime worker.
//! Dropping the `find_similar` future (e.g. when the analyzer's deadline
//! fires) flags the scan as cancelled; the blocking thread stops before
//! its next candidate.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docsift_core::error::SimilarityError;
use docsift_core::models::SimilarFile;
use docsift_core::similarity::{score_corpus_until, SimilarityBackend, SimilarityParams};
use docsift_core::store::ResultStore;

/// Default backend: full scan of the store's corpus.
pub struct CorpusScan {
    store: Arc<dyn ResultStore>,
    params: SimilarityParams,
}

impl CorpusScan {
    pub fn new(store: Arc<dyn ResultStore>, params: SimilarityParams) -> Self {
        Self { store, params }
    }
}

/// Flags the scan as cancelled when dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl SimilarityBackend for CorpusScan {
    fn name(&self) -> &str {
        self.params.method.as_str()
    }

    async fn find_similar(
        &self,
        doc_id: &str,
        text: &str,
    ) -> Result<Vec<SimilarFile>, SimilarityError> {
        let corpus = self.store.corpus_except(doc_id).await?;
        tracing::debug!(
            doc_id,
            candidates = corpus.len(),
            method = self.params.method.as_str(),
            "scoring corpus"
        );

        let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
        let cancelled = Arc::clone(&cancel.0);
        let doc_id = doc_id.to_string();
        let text = text.to_string();
        let params = self.params.clone();

        let scored = tokio::task::spawn_blocking(move || {
            score_corpus_until(&doc_id, &text, &corpus, &params, &cancelled)
        })
        .await
        .map_err(|e| SimilarityError::Backend(format!("scoring task failed: {e}")))?;

        scored.ok_or_else(|| SimilarityError::Backend("corpus scan cancelled".into()))
    }
}
