//! Similarity engine: scores a document against the corpus.
//!
//! The engine operates on normalized text and is independent of where the
//! corpus comes from. Backends implement [`SimilarityBackend`]; the scan
//! backend in the app crate feeds the store's corpus to
//! [`score_corpus_until`] on a blocking thread.
//!
//! # Normalization
//!
//! 1. Lowercase.
//! 2. Drop every character that is not alphanumeric, whitespace, `'` or `-`.
//! 3. Collapse whitespace runs to one space and trim.
//!
//! # Scoring Methods
//!
//! | Method | Score |
//! |--------|-------|
//! | `word_overlap` | `|W(current) ∩ W(candidate)| / |W(current)| × 100` over distinct words |
//! | `trigram` | `|T(current) ∩ T(candidate)| / |T(current) ∪ T(candidate)| × 100` over word trigrams |
//!
//! # Ranking
//!
//! Candidates scoring strictly above the threshold are kept, the current
//! document is always dropped, the rest is sorted by score (desc) then
//! `doc_id` (asc) and truncated to `max_matches`.
//!
//! # Example
//!
//! ```rust
//! use docsift_core::models::CorpusDocument;
//! use docsift_core::similarity::{score_corpus, SimilarityParams};
//!
//! let corpus = vec![CorpusDocument {
//!     doc_id: "a".into(),
//!     display_name: "a.txt".into(),
//!     content: "the quick brown fox".into(),
//! }];
//! let matches = score_corpus("b", "the quick brown dog", &corpus, &SimilarityParams::default());
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].score, 75.0);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SimilarityError;
use crate::models::{CorpusDocument, SimilarFile};

/// Default inclusion threshold, in percent.
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// Upper bound on the number of matches kept per result.
pub const MAX_MATCHES: usize = 5;

/// How two normalized texts are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Share of the current document's distinct words found in the candidate.
    #[default]
    WordOverlap,
    /// Jaccard similarity of padded word trigrams.
    Trigram,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordOverlap => "word_overlap",
            Self::Trigram => "trigram",
        }
    }
}

/// Tuning parameters for one similarity run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityParams {
    /// Candidates must score strictly above this percentage.
    pub threshold: f64,
    /// Maximum matches returned (capped at [`MAX_MATCHES`]).
    pub max_matches: usize,
    pub method: ScoringMethod,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_matches: MAX_MATCHES,
            method: ScoringMethod::WordOverlap,
        }
    }
}

/// Normalize text for comparison and word-cloud rendering.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() || ch == '\'' || ch == '-' {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }

    out
}

/// Distinct words of normalized text.
///
/// Tokens made only of apostrophes and hyphens are not words.
pub fn distinct_words(normalized: &str) -> HashSet<&str> {
    normalized
        .split(' ')
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect()
}

/// Padded character trigrams of every word in normalized text.
pub fn trigrams(normalized: &str) -> HashSet<String> {
    let mut grams = HashSet::new();
    for word in distinct_words(normalized) {
        let padded: Vec<char> = format!("  {} ", word).chars().collect();
        for window in padded.windows(3) {
            grams.insert(window.iter().collect());
        }
    }
    grams
}

fn features(method: ScoringMethod, normalized: &str) -> HashSet<String> {
    match method {
        ScoringMethod::WordOverlap => distinct_words(normalized)
            .into_iter()
            .map(str::to_string)
            .collect(),
        ScoringMethod::Trigram => trigrams(normalized),
    }
}

fn score_features(
    method: ScoringMethod,
    current: &HashSet<String>,
    candidate: &HashSet<String>,
) -> f64 {
    if current.is_empty() {
        return 0.0;
    }
    let shared = current.intersection(candidate).count() as f64;
    let denom = match method {
        ScoringMethod::WordOverlap => current.len(),
        ScoringMethod::Trigram => current.union(candidate).count(),
    } as f64;

    (shared / denom * 100.0).clamp(0.0, 100.0)
}

/// Score two raw texts with the given method.
pub fn score(method: ScoringMethod, current: &str, candidate: &str) -> f64 {
    score_features(
        method,
        &features(method, &normalize(current)),
        &features(method, &normalize(candidate)),
    )
}

/// Filter, order and truncate scored candidates.
///
/// Shared by every backend so the ranking contract holds regardless of
/// how scores were produced.
pub fn rank_matches(
    doc_id: &str,
    candidates: Vec<SimilarFile>,
    params: &SimilarityParams,
) -> Vec<SimilarFile> {
    let mut matches: Vec<SimilarFile> = candidates
        .into_iter()
        .filter(|c| c.doc_id != doc_id)
        .map(|mut c| {
            c.score = c.score.clamp(0.0, 100.0);
            c
        })
        .filter(|c| c.score > params.threshold)
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    matches.truncate(params.max_matches.min(MAX_MATCHES));
    matches
}

/// Score `text` against every corpus document and rank the results.
pub fn score_corpus(
    doc_id: &str,
    text: &str,
    corpus: &[CorpusDocument],
    params: &SimilarityParams,
) -> Vec<SimilarFile> {
    score_corpus_until(doc_id, text, corpus, params, &AtomicBool::new(false)).unwrap_or_default()
}

/// Like [`score_corpus`], but checks `cancelled` before each candidate and
/// returns `None` as soon as it is set.
pub fn score_corpus_until(
    doc_id: &str,
    text: &str,
    corpus: &[CorpusDocument],
    params: &SimilarityParams,
    cancelled: &AtomicBool,
) -> Option<Vec<SimilarFile>> {
    let current = features(params.method, &normalize(text));
    if current.is_empty() {
        return Some(Vec::new());
    }

    let mut scored = Vec::with_capacity(corpus.len());
    for doc in corpus.iter().filter(|doc| doc.doc_id != doc_id) {
        if cancelled.load(Ordering::Relaxed) {
            tracing::debug!(doc_id, scored = scored.len(), "corpus scan cancelled");
            return None;
        }
        scored.push(SimilarFile {
            doc_id: doc.doc_id.clone(),
            display_name: doc.display_name.clone(),
            score: score_features(
                params.method,
                &current,
                &features(params.method, &normalize(&doc.content)),
            ),
        });
    }

    Some(rank_matches(doc_id, scored, params))
}

/// Pluggable similarity strategy.
///
/// Implementations must return scores in `[0, 100]`, sorted descending,
/// never containing `doc_id`, at most [`MAX_MATCHES`] long.
/// [`rank_matches`] enforces all of this.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn find_similar(
        &self,
        doc_id: &str,
        text: &str,
    ) -> Result<Vec<SimilarFile>, SimilarityError>;
}
