use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docsift::analyzer::{Analyzer, AnalyzerOptions};
use docsift::similarity::CorpusScan;
use docsift_core::error::{
    AnalyzeError, ContentError, ErrorKind, SimilarityError, StoreError, WordCloudError,
};
use docsift_core::models::{AnalysisResult, CorpusDocument, SimilarFile, SourceDocument};
use docsift_core::similarity::{SimilarityBackend, SimilarityParams};
use docsift_core::source::ContentSource;
use docsift_core::store::memory::InMemoryStore;
use docsift_core::store::{blob_ref, ResultStore};
use docsift_core::wordcloud::{DisabledRenderer, WordCloudRenderer};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

// ============ Collaborator doubles ============

/// Serves fixed documents and counts fetches.
struct MapSource {
    docs: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MapSource {
    fn new(docs: &[(&str, &str)]) -> Self {
        Self {
            docs: docs
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .collect(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MapSource {
    fn name(&self) -> &str {
        "map"
    }

    async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let content = self.docs.get(doc_id).ok_or_else(|| ContentError::NotFound {
            doc_id: doc_id.to_string(),
        })?;
        Ok(SourceDocument {
            doc_id: doc_id.to_string(),
            display_name: format!("{doc_id}.txt"),
            content: content.clone(),
        })
    }
}

enum SimilarityMode {
    Fail,
    Hang,
}

struct BrokenSimilarity {
    mode: SimilarityMode,
    calls: AtomicUsize,
}

impl BrokenSimilarity {
    fn new(mode: SimilarityMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SimilarityBackend for BrokenSimilarity {
    fn name(&self) -> &str {
        "broken"
    }

    async fn find_similar(
        &self,
        _doc_id: &str,
        _text: &str,
    ) -> Result<Vec<SimilarFile>, SimilarityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            SimilarityMode::Fail => Err(SimilarityError::Backend("index offline".into())),
            SimilarityMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Delegates to a corpus scan and counts calls.
struct CountingSimilarity {
    inner: CorpusScan,
    calls: AtomicUsize,
}

impl CountingSimilarity {
    fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            inner: CorpusScan::new(store, SimilarityParams::default()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityBackend for CountingSimilarity {
    fn name(&self) -> &str {
        "counting"
    }

    async fn find_similar(
        &self,
        doc_id: &str,
        text: &str,
    ) -> Result<Vec<SimilarFile>, SimilarityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_similar(doc_id, text).await
    }
}

/// Records the text it was asked to render.
struct RecordingRenderer {
    outcome: Result<Vec<u8>, WordCloudError>,
    seen: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    fn ok() -> Self {
        Self {
            outcome: Ok(PNG.to_vec()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            outcome: Err(WordCloudError::Status(500)),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl WordCloudRenderer for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn render(&self, text: &str) -> Result<Vec<u8>, WordCloudError> {
        self.seen.lock().unwrap().push(text.to_string());
        self.outcome.clone()
    }
}

/// A store whose `save` loses a race against another writer.
struct RacingStore {
    inner: InMemoryStore,
}

#[async_trait]
impl ResultStore for RacingStore {
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        self.inner.get_by_doc_id(doc_id).await
    }

    async fn save(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let competitor = AnalysisResult {
            id: "stored-by-other-instance".to_string(),
            ..result.clone()
        };
        self.inner.save(&competitor).await?;
        Err(StoreError::Conflict {
            doc_id: result.doc_id.clone(),
        })
    }

    async fn corpus_except(&self, doc_id: &str) -> Result<Vec<CorpusDocument>, StoreError> {
        self.inner.corpus_except(doc_id).await
    }

    async fn index_document(&self, doc: &CorpusDocument) -> Result<(), StoreError> {
        self.inner.index_document(doc).await
    }

    async fn save_blob(&self, bytes: &[u8]) -> Result<String, StoreError> {
        self.inner.save_blob(bytes).await
    }

    async fn get_blob(&self, blob_ref: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.get_blob(blob_ref).await
    }
}

/// A store that cannot persist results.
struct ReadOnlyStore {
    inner: InMemoryStore,
}

#[async_trait]
impl ResultStore for ReadOnlyStore {
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        self.inner.get_by_doc_id(doc_id).await
    }

    async fn save(&self, _result: &AnalysisResult) -> Result<(), StoreError> {
        Err(StoreError::backend("database is locked"))
    }

    async fn corpus_except(&self, doc_id: &str) -> Result<Vec<CorpusDocument>, StoreError> {
        self.inner.corpus_except(doc_id).await
    }

    async fn index_document(&self, doc: &CorpusDocument) -> Result<(), StoreError> {
        self.inner.index_document(doc).await
    }

    async fn save_blob(&self, bytes: &[u8]) -> Result<String, StoreError> {
        self.inner.save_blob(bytes).await
    }

    async fn get_blob(&self, blob_ref: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.get_blob(blob_ref).await
    }
}

// ============ Helpers ============

fn corpus_doc(doc_id: &str, content: &str) -> CorpusDocument {
    CorpusDocument {
        doc_id: doc_id.to_string(),
        display_name: format!("{doc_id}.txt"),
        content: content.to_string(),
    }
}

fn build(
    store: Arc<dyn ResultStore>,
    source: Arc<dyn ContentSource>,
    similarity: Option<Arc<dyn SimilarityBackend>>,
    renderer: Arc<dyn WordCloudRenderer>,
    options: AnalyzerOptions,
) -> Analyzer {
    let similarity: Arc<dyn SimilarityBackend> = match similarity {
        Some(backend) => backend,
        None => Arc::new(CorpusScan::new(
            Arc::clone(&store),
            SimilarityParams::default(),
        )),
    };
    Analyzer::new(store, source, similarity, renderer, options)
}

// ============ Idempotence ============

#[tokio::test]
async fn test_second_call_returns_stored_result_without_side_effects() {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(MapSource::new(&[("doc-1", "some words here")]));
    let renderer = Arc::new(RecordingRenderer::ok());
    let similarity = Arc::new(CountingSimilarity::new(store.clone()));
    let analyzer = build(
        store.clone(),
        source.clone(),
        Some(similarity.clone() as Arc<dyn SimilarityBackend>),
        renderer.clone(),
        AnalyzerOptions::default(),
    );

    let first = analyzer.analyze("doc-1").await.unwrap();
    let second = analyzer.analyze("doc-1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(), 1);
    assert_eq!(similarity.calls(), 1);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(store.result_count(), 1);
}

#[tokio::test]
async fn test_stored_result_survives_source_changes() {
    let store = Arc::new(InMemoryStore::new());
    let before = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "one two three")])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );
    let original = before.analyze("doc-1").await.unwrap();

    let after = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "completely different text now")])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );
    assert_eq!(after.analyze("doc-1").await.unwrap(), original);
}

// ============ Concurrency ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_compute_once() {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(
        MapSource::new(&[("doc-1", "the quick brown fox jumps")])
            .with_delay(Duration::from_millis(50)),
    );
    let analyzer = Arc::new(build(
        store.clone(),
        source.clone(),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let analyzer = analyzer.clone();
        handles.push(tokio::spawn(async move {
            analyzer.analyze("doc-1").await.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().id);
    }

    assert!(ids.iter().all(|id| id == &ids[0]));
    assert_eq!(source.calls(), 1);
    assert_eq!(store.result_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_documents_analyze_in_parallel() {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(
        MapSource::new(&[("a", "alpha text"), ("b", "beta text")])
            .with_delay(Duration::from_millis(300)),
    );
    let analyzer = Arc::new(build(
        store.clone(),
        source.clone(),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    ));

    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(analyzer.analyze("a"), analyzer.analyze("b"));
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() < Duration::from_millis(550));
    assert_eq!(store.result_count(), 2);
}

#[tokio::test]
async fn test_save_conflict_returns_competing_result() {
    let store = Arc::new(RacingStore {
        inner: InMemoryStore::new(),
    });
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "words")])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("doc-1").await.unwrap();
    assert_eq!(result.id, "stored-by-other-instance");
    assert_eq!(store.inner.result_count(), 1);
}

// ============ Fatal failures ============

#[tokio::test]
async fn test_empty_content_is_rejected_and_not_persisted() {
    let store = Arc::new(InMemoryStore::new());
    let renderer = Arc::new(RecordingRenderer::ok());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("blank", " \n\n\t "), ("empty", "")])),
        None,
        renderer.clone(),
        AnalyzerOptions::default(),
    );

    for id in ["blank", "empty"] {
        let err = analyzer.analyze(id).await.unwrap_err();
        assert_eq!(
            err,
            AnalyzeError::EmptyContent {
                doc_id: id.to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }
    assert_eq!(store.result_count(), 0);
    assert_eq!(renderer.calls(), 0);
    assert!(store.corpus_except("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_document_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let err = analyzer.analyze("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.result_count(), 0);
}

#[tokio::test]
async fn test_fetch_timeout_is_fatal() {
    let store = Arc::new(InMemoryStore::new());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "words")]).with_delay(Duration::from_secs(5))),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions {
            fetch_timeout: Duration::from_millis(50),
            ..AnalyzerOptions::default()
        },
    );

    let err = analyzer.analyze("doc-1").await.unwrap_err();
    assert!(matches!(
        err,
        AnalyzeError::ContentFetch {
            source: ContentError::Timeout { .. },
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(store.result_count(), 0);
}

#[tokio::test]
async fn test_storage_failure_is_fatal() {
    let store = Arc::new(ReadOnlyStore {
        inner: InMemoryStore::new(),
    });
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "words")])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let err = analyzer.analyze("doc-1").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Storage(StoreError::Backend(_))));
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(store.inner.result_count(), 0);
    // Nothing was indexed either.
    assert!(store.inner.corpus_except("").await.unwrap().is_empty());
}

// ============ Best-effort steps ============

#[tokio::test]
async fn test_similarity_failure_degrades_to_no_matches() {
    let store = Arc::new(InMemoryStore::with_corpus([corpus_doc(
        "a",
        "the quick brown fox",
    )]));
    let similarity = Arc::new(BrokenSimilarity::new(SimilarityMode::Fail));
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("b", "the quick brown dog")])),
        Some(similarity.clone() as Arc<dyn SimilarityBackend>),
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("b").await.unwrap();
    assert!(result.similar_matches.is_empty());
    assert_eq!(result.plagiarism_score, 0.0);
    assert_eq!(similarity.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_by_doc_id("b").await.unwrap(), Some(result));
}

#[tokio::test]
async fn test_similarity_timeout_degrades_to_no_matches() {
    let store = Arc::new(InMemoryStore::new());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("b", "the quick brown dog")])),
        Some(Arc::new(BrokenSimilarity::new(SimilarityMode::Hang)) as Arc<dyn SimilarityBackend>),
        Arc::new(DisabledRenderer),
        AnalyzerOptions {
            similarity_timeout: Duration::from_millis(50),
            ..AnalyzerOptions::default()
        },
    );

    let result = analyzer.analyze("b").await.unwrap();
    assert!(result.similar_matches.is_empty());
    assert_eq!(store.result_count(), 1);
}

#[tokio::test]
async fn test_similarity_deadline_bounds_large_corpus_scan() {
    let text: String = (0..3000).map(|i| format!("w{i} ")).collect();
    let corpus = (0..1500).map(|i| corpus_doc(&format!("d{i:04}"), &text));
    let store = Arc::new(InMemoryStore::with_corpus(corpus));
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("x", text.as_str())])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions {
            similarity_timeout: Duration::from_millis(50),
            index_on_analyze: false,
            ..AnalyzerOptions::default()
        },
    );

    let started = std::time::Instant::now();
    let result = analyzer.analyze("x").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(result.similar_matches.is_empty());
    assert_eq!(store.result_count(), 1);
}

#[tokio::test]
async fn test_word_cloud_skipped_when_nothing_to_render() {
    let store = Arc::new(InMemoryStore::new());
    let renderer = Arc::new(RecordingRenderer::ok());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "!!! ???")])),
        None,
        renderer.clone(),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("doc-1").await.unwrap();
    assert_eq!(result.words, 2);
    assert!(result.word_cloud_ref.is_none());
    assert_eq!(renderer.calls(), 0);
    assert_eq!(store.blob_count(), 0);
}

#[tokio::test]
async fn test_word_cloud_failure_leaves_ref_absent() {
    let store = Arc::new(InMemoryStore::new());
    let renderer = Arc::new(RecordingRenderer::failing());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "some words")])),
        None,
        renderer.clone(),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("doc-1").await.unwrap();
    assert!(result.word_cloud_ref.is_none());
    assert_eq!(renderer.calls(), 1);
    assert_eq!(store.blob_count(), 0);
    assert_eq!(store.result_count(), 1);
}

#[tokio::test]
async fn test_word_cloud_is_stored_and_referenced() {
    let store = Arc::new(InMemoryStore::new());
    let renderer = Arc::new(RecordingRenderer::ok());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("doc-1", "Hello, World!\n\nHello again.")])),
        None,
        renderer.clone(),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("doc-1").await.unwrap();
    let reference = result.word_cloud_ref.expect("word cloud ref");
    assert_eq!(reference, blob_ref(PNG));
    assert_eq!(store.get_blob(&reference).await.unwrap(), PNG.to_vec());
    assert_eq!(
        *renderer.seen.lock().unwrap(),
        vec!["hello world hello again".to_string()]
    );
}

// ============ Similarity scenario ============

#[tokio::test]
async fn test_overlapping_document_is_ranked_first() {
    let store = Arc::new(InMemoryStore::with_corpus([
        corpus_doc("a", "the quick brown fox"),
        corpus_doc("c", "lorem ipsum dolor sit amet"),
    ]));
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[("b", "the quick brown dog")])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let result = analyzer.analyze("b").await.unwrap();
    assert_eq!(result.similar_matches.len(), 1);
    assert_eq!(result.similar_matches[0].doc_id, "a");
    assert_eq!(result.similar_matches[0].display_name, "a.txt");
    assert_eq!(result.similar_matches[0].score, 75.0);
    assert_eq!(result.plagiarism_score, 75.0);
}

#[tokio::test]
async fn test_analyzed_documents_join_the_corpus() {
    let store = Arc::new(InMemoryStore::new());
    let analyzer = build(
        store.clone(),
        Arc::new(MapSource::new(&[
            ("first", "the quick brown fox"),
            ("second", "the quick brown dog"),
        ])),
        None,
        Arc::new(DisabledRenderer),
        AnalyzerOptions::default(),
    );

    let first = analyzer.analyze("first").await.unwrap();
    assert!(first.similar_matches.is_empty());

    let second = analyzer.analyze("second").await.unwrap();
    assert_eq!(second.similar_matches.len(), 1);
    assert_eq!(second.similar_matches[0].doc_id, "first");
    assert_eq!(second.similar_matches[0].score, 75.0);
}
