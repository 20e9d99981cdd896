//! SQLite-backed [`ResultStore`] implementation.
//!
//! Maps each [`ResultStore`] operation onto the schema created by
//! [`migrate`](crate::migrate). Uniqueness on `doc_id` is enforced by the
//! `analysis_results.doc_id UNIQUE` constraint; a violation surfaces as
//! [`StoreError::Conflict`] so the analyzer can re-read the winner.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docsift_core::error::StoreError;
use docsift_core::models::{AnalysisResult, CorpusDocument, SimilarFile};
use docsift_core::store::{blob_ref, ResultStore};

/// SQLite implementation of the [`ResultStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of persisted analysis results.
    pub async fn result_count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM analysis_results")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)
    }
}

fn row_to_result(row: &SqliteRow) -> Result<AnalysisResult, StoreError> {
    let matches_json: String = row.try_get("similar_matches_json").map_err(StoreError::backend)?;
    let similar_matches: Vec<SimilarFile> =
        serde_json::from_str(&matches_json).map_err(StoreError::backend)?;

    let count = |col: &str| -> Result<u64, StoreError> {
        let v: i64 = row.try_get(col).map_err(StoreError::backend)?;
        Ok(v.max(0) as u64)
    };

    Ok(AnalysisResult {
        id: row.try_get("id").map_err(StoreError::backend)?,
        doc_id: row.try_get("doc_id").map_err(StoreError::backend)?,
        paragraphs: count("paragraphs")?,
        words: count("words")?,
        characters: count("characters")?,
        similar_matches,
        plagiarism_score: row.try_get("plagiarism_score").map_err(StoreError::backend)?,
        word_cloud_ref: row.try_get("word_cloud_ref").map_err(StoreError::backend)?,
        analyzed_at: row.try_get("analyzed_at").map_err(StoreError::backend)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, doc_id, paragraphs, words, characters, similar_matches_json,
                   plagiarism_score, word_cloud_ref, analyzed_at
            FROM analysis_results
            WHERE doc_id = ?
            "#,
        )
        .bind(doc_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.as_ref().map(row_to_result).transpose()
    }

    async fn save(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let matches_json =
            serde_json::to_string(&result.similar_matches).map_err(StoreError::backend)?;

        sqlx::query(
            r#"
            INSERT INTO analysis_results (id, doc_id, paragraphs, words, characters,
                                          similar_matches_json, plagiarism_score,
                                          word_cloud_ref, analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.id)
        .bind(&result.doc_id)
        .bind(result.paragraphs as i64)
        .bind(result.words as i64)
        .bind(result.characters as i64)
        .bind(&matches_json)
        .bind(result.plagiarism_score)
        .bind(&result.word_cloud_ref)
        .bind(&result.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict {
                    doc_id: result.doc_id.clone(),
                }
            } else {
                StoreError::backend(e)
            }
        })?;

        Ok(())
    }

    async fn corpus_except(&self, doc_id: &str) -> Result<Vec<CorpusDocument>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc_id, display_name, content FROM corpus_documents WHERE doc_id != ?",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.iter()
            .map(|row| {
                Ok(CorpusDocument {
                    doc_id: row.try_get("doc_id").map_err(StoreError::backend)?,
                    display_name: row.try_get("display_name").map_err(StoreError::backend)?,
                    content: row.try_get("content").map_err(StoreError::backend)?,
                })
            })
            .collect()
    }

    async fn index_document(&self, doc: &CorpusDocument) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO corpus_documents (doc_id, display_name, content)
            VALUES (?, ?, ?)
            ON CONFLICT(doc_id) DO UPDATE SET
                display_name = excluded.display_name,
                content = excluded.content
            "#,
        )
        .bind(&doc.doc_id)
        .bind(&doc.display_name)
        .bind(&doc.content)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn save_blob(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let key = blob_ref(bytes);
        sqlx::query("INSERT OR IGNORE INTO word_clouds (blob_ref, image) VALUES (?, ?)")
            .bind(&key)
            .bind(bytes)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(key)
    }

    async fn get_blob(&self, blob_ref: &str) -> Result<Vec<u8>, StoreError> {
        let image: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT image FROM word_clouds WHERE blob_ref = ?")
                .bind(blob_ref)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        image.ok_or_else(|| StoreError::NotFound(blob_ref.to_string()))
    }
}
