//! CLI commands for analyzing documents and inspecting stored results.

use anyhow::{bail, Context, Result};
use std::path::Path;

use docsift_core::error::StoreError;
use docsift_core::models::AnalysisResult;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::stores::create_store;

/// `docsift analyze <doc_id>`: analyze (or look up) and print the result.
pub async fn run_analyze(config: &Config, doc_id: &str, json: bool) -> Result<()> {
    let store = create_store(config).await?;
    let analyzer = Analyzer::from_config(config, store)?;

    let result = analyzer
        .analyze(doc_id)
        .await
        .with_context(|| format!("analysis of '{}' failed", doc_id))?;

    print_result(&result, json)
}

/// `docsift show <doc_id>`: print the stored result without computing.
pub async fn run_show(config: &Config, doc_id: &str, json: bool) -> Result<()> {
    let store = create_store(config).await?;

    match store.get_by_doc_id(doc_id.trim()).await? {
        Some(result) => print_result(&result, json),
        None => bail!("no analysis stored for document: {}", doc_id),
    }
}

/// `docsift wordcloud <ref> --out <path>`: export a stored image.
pub async fn run_wordcloud(config: &Config, blob_ref: &str, out: &Path) -> Result<()> {
    let store = create_store(config).await?;

    let image = match store.get_blob(blob_ref).await {
        Ok(image) => image,
        Err(StoreError::NotFound(_)) => bail!("word cloud not found: {}", blob_ref),
        Err(e) => return Err(e.into()),
    };

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, &image)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Wrote {} bytes to {}", image.len(), out.display());
    Ok(())
}

fn print_result(result: &AnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("--- Analysis ---");
    println!("id:          {}", result.id);
    println!("doc_id:      {}", result.doc_id);
    println!("analyzed_at: {}", result.analyzed_at);
    println!("paragraphs:  {}", result.paragraphs);
    println!("words:       {}", result.words);
    println!("characters:  {}", result.characters);
    println!("plagiarism:  {:.2}", result.plagiarism_score);
    println!(
        "word_cloud:  {}",
        result.word_cloud_ref.as_deref().unwrap_or("(none)")
    );
    println!();

    println!("--- Similar Documents ({}) ---", result.similar_matches.len());
    for (i, m) in result.similar_matches.iter().enumerate() {
        println!("{}. [{:.2}] {} ({})", i + 1, m.score, m.display_name, m.doc_id);
    }

    Ok(())
}
