//! Corpus seeding from the filesystem source.
//!
//! `docsift index` walks `[source] root`, applies the include and exclude
//! globs, and upserts every non-empty file into the comparison corpus.
//! Re-running it refreshes changed files in place.

use anyhow::{Context, Result};

use docsift_core::models::CorpusDocument;
use docsift_core::store::ResultStore;

use crate::config::Config;
use crate::sources::filesystem_source;
use crate::stores::create_store;

/// Counts reported by an indexing run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub indexed: usize,
    pub skipped_empty: usize,
}

pub async fn run_index(config: &Config) -> Result<()> {
    let store = create_store(config).await?;
    let stats = index_corpus(config, store.as_ref()).await?;

    println!(
        "Indexed {} documents ({} empty skipped).",
        stats.indexed, stats.skipped_empty
    );
    Ok(())
}

/// Upsert every visible filesystem document into `store`'s corpus.
pub async fn index_corpus(config: &Config, store: &dyn ResultStore) -> Result<IndexStats> {
    let source = filesystem_source(config).context("docsift index reads from [source] root")?;
    let mut stats = IndexStats::default();

    for doc in source.list()? {
        if doc.content.trim().is_empty() {
            tracing::debug!(doc_id = %doc.doc_id, "skipping empty document");
            stats.skipped_empty += 1;
            continue;
        }

        let doc = CorpusDocument::from(doc);
        store
            .index_document(&doc)
            .await
            .with_context(|| format!("Failed to index {}", doc.doc_id))?;
        stats.indexed += 1;
    }

    tracing::info!(
        indexed = stats.indexed,
        skipped_empty = stats.skipped_empty,
        "corpus indexed"
    );
    Ok(stats)
}
