//! Core data models that flow through the analysis pipeline.
//!
//! [`AnalysisResult`] is the one persisted record per document. The other
//! types are views of documents owned by collaborators: what a content
//! source returns ([`SourceDocument`]) and what the corpus index returns
//! for comparison ([`CorpusDocument`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::TextMetrics;

/// The canonical analysis of one document.
///
/// At most one exists per `doc_id`. Once persisted it is never modified;
/// repeated analysis requests return the stored value unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Opaque UUID assigned at creation.
    pub id: String,
    /// The analyzed document's identifier (unique key).
    #[serde(rename = "docID")]
    pub doc_id: String,
    pub paragraphs: u64,
    pub words: u64,
    pub characters: u64,
    /// Ranked overlap matches, best first, never containing `doc_id`.
    pub similar_matches: Vec<SimilarFile>,
    /// Highest score in `similar_matches`, or `0.0` when there are none.
    pub plagiarism_score: f64,
    /// Reference to the stored word-cloud image, if one was produced.
    pub word_cloud_ref: Option<String>,
    /// Creation time (ISO 8601, UTC).
    pub analyzed_at: String,
}

impl AnalysisResult {
    /// Assemble a fresh result with a new id and the current timestamp.
    pub fn new(
        doc_id: &str,
        metrics: TextMetrics,
        similar_matches: Vec<SimilarFile>,
        word_cloud_ref: Option<String>,
    ) -> Self {
        let plagiarism_score = similar_matches
            .iter()
            .map(|m| m.score)
            .fold(0.0, f64::max);

        Self {
            id: Uuid::new_v4().to_string(),
            doc_id: doc_id.to_string(),
            paragraphs: metrics.paragraphs,
            words: metrics.words,
            characters: metrics.characters,
            similar_matches,
            plagiarism_score,
            word_cloud_ref,
            analyzed_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        }
    }
}

/// One overlapping document found by the similarity engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarFile {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Overlap percentage in `[0.0, 100.0]`.
    pub score: f64,
}

/// A document available for comparison, as held by the corpus index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub doc_id: String,
    pub display_name: String,
    pub content: String,
}

/// A document as returned by a content source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub doc_id: String,
    /// Original file name or path, used as the match display name.
    pub display_name: String,
    pub content: String,
}

impl From<SourceDocument> for CorpusDocument {
    fn from(doc: SourceDocument) -> Self {
        Self {
            doc_id: doc.doc_id,
            display_name: doc.display_name,
            content: doc.content,
        }
    }
}
