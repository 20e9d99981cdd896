//! Result store selection.

use anyhow::{Context, Result};
use std::sync::Arc;

use docsift_core::store::memory::InMemoryStore;
use docsift_core::store::ResultStore;

use crate::config::{Config, StoreBackend};
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

/// Build the backend named by `[store].backend`.
///
/// The SQLite backend is migrated on open, so a fresh database path works
/// without running `docsift init` first.
pub async fn create_store(config: &Config) -> Result<Arc<dyn ResultStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let pool = db::connect(config).await.with_context(|| {
                format!("Failed to open database: {}", config.db.path.display())
            })?;
            migrate::apply(&pool).await?;
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, results are lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
