//! Content source selection.
//!
//! Builds the configured [`ContentSource`] once at startup. The analyzer
//! only ever sees the trait object.

use anyhow::{Context, Result};
use std::sync::Arc;

use docsift_core::source::ContentSource;

use crate::config::{Config, SourceKind};
use crate::source_fs::FilesystemContentSource;
use crate::source_http::HttpContentSource;

pub fn create_source(config: &Config) -> Result<Arc<dyn ContentSource>> {
    match config.source.kind {
        SourceKind::Http => {
            let base_url = config
                .source
                .base_url
                .as_deref()
                .context("source.base_url required for http source")?;
            Ok(Arc::new(HttpContentSource::new(
                base_url,
                config.source_timeout(),
            )?))
        }
        SourceKind::Filesystem => Ok(Arc::new(filesystem_source(config)?)),
    }
}

/// The filesystem source on its own, for commands that need to list it.
pub fn filesystem_source(config: &Config) -> Result<FilesystemContentSource> {
    let root = config
        .source
        .root
        .as_deref()
        .context("source.root required for filesystem source")?;
    FilesystemContentSource::new(
        root,
        &config.source.include_globs,
        &config.source.exclude_globs,
    )
}
