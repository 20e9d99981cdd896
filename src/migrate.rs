//! Database schema migrations (idempotent).
//!
//! | Table | Purpose |
//! |-------|---------|
//! | `analysis_results` | One row per analyzed document, `UNIQUE(doc_id)` |
//! | `corpus_documents` | Comparison corpus, keyed by `doc_id` |
//! | `word_clouds` | Content-addressed image blobs |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the database and all tables. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an existing pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_results (
            id TEXT PRIMARY KEY,
            doc_id TEXT NOT NULL UNIQUE,
            paragraphs INTEGER NOT NULL,
            words INTEGER NOT NULL,
            characters INTEGER NOT NULL,
            similar_matches_json TEXT NOT NULL DEFAULT '[]',
            plagiarism_score REAL NOT NULL DEFAULT 0,
            word_cloud_ref TEXT,
            analyzed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS corpus_documents (
            doc_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            content TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS word_clouds (
            blob_ref TEXT PRIMARY KEY,
            image BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
