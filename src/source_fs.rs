//! Filesystem content source.
//!
//! Serves documents from a local directory. A document id is the file's
//! path relative to `root`, with `/` separators (e.g. `essays/week1.txt`).
//! Only files matching the include globs and none of the exclude globs are
//! visible; ids that would escape `root`, directly or through a symlink,
//! resolve to "not found". Ids are canonical: `./a.txt` is not an alias of
//! `a.txt`.

use anyhow::{bail, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use docsift_core::error::ContentError;
use docsift_core::models::SourceDocument;
use docsift_core::source::ContentSource;

pub struct FilesystemContentSource {
    root: PathBuf,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

impl FilesystemContentSource {
    pub fn new(root: &Path, include_globs: &[String], exclude_globs: &[String]) -> Result<Self> {
        if !root.is_dir() {
            bail!("source.root does not exist or is not a directory: {}", root.display());
        }

        let mut excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        excludes.extend(exclude_globs.iter().cloned());

        Ok(Self {
            root: std::fs::canonicalize(root)?,
            include_set: build_globset(include_globs)?,
            exclude_set: build_globset(&excludes)?,
        })
    }

    fn is_visible(&self, rel: &str) -> bool {
        self.include_set.is_match(rel) && !self.exclude_set.is_match(rel)
    }

    /// Map a document id to a path under `root`, refusing anything that
    /// is absolute, climbs out of it or is not in canonical form.
    fn resolve(&self, doc_id: &str) -> Option<PathBuf> {
        let rel = Path::new(doc_id);
        let canonical = rel.components().all(|c| matches!(c, Component::Normal(_)))
            && !doc_id.contains('\\')
            && doc_id
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        if doc_id.is_empty() || !canonical || !self.is_visible(doc_id) {
            return None;
        }
        Some(self.root.join(rel))
    }

    /// Every visible document under `root`, sorted by id.
    pub fn list(&self) -> Result<Vec<SourceDocument>> {
        let mut docs = Vec::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if !self.is_visible(&rel_str) {
                continue;
            }

            let bytes = std::fs::read(path)?;
            docs.push(SourceDocument {
                display_name: rel_str.clone(),
                doc_id: rel_str,
                content: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        docs.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        Ok(docs)
    }
}

#[async_trait]
impl ContentSource for FilesystemContentSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self, doc_id: &str) -> Result<SourceDocument, ContentError> {
        let not_found = || ContentError::NotFound {
            doc_id: doc_id.to_string(),
        };
        let unavailable = |path: &Path, e: std::io::Error| {
            ContentError::Unavailable(format!("failed to read {}: {}", path.display(), e))
        };
        let joined = self.resolve(doc_id).ok_or_else(not_found)?;

        let path = match tokio::fs::canonicalize(&joined).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(unavailable(&joined, e)),
        };
        // Symlinks must not lead outside the root.
        if !path.starts_with(&self.root) {
            tracing::warn!(doc_id, "document resolves outside source root");
            return Err(not_found());
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(unavailable(&path, e)),
        };

        Ok(SourceDocument {
            doc_id: doc_id.to_string(),
            display_name: doc_id.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
