//! Document sources.
//!
//! A [`DocumentSource`] produces the full corpus on every call to
//! [`load`](DocumentSource::load); the cache turns that into a fresh index
//! snapshot. [`FilesystemSource`] is the built-in implementation backed by
//! a directory tree of text files.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use knowledge_harness_core::models::Document;

use crate::config::Config;

/// Something that can enumerate the current corpus.
///
/// Implementations should absorb per-document failures (an unreadable file
/// becomes an empty document) and only return `Err` when the source as a
/// whole is unavailable.
pub trait DocumentSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Load every document, sorted by path.
    fn load(&self) -> Result<Vec<Document>>;
}

/// Recursively reads text files under a root directory.
pub struct FilesystemSource {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FilesystemSource {
    pub fn new(
        root: impl Into<PathBuf>,
        include_globs: &[String],
        exclude_globs: &[String],
        follow_symlinks: bool,
    ) -> Result<Self> {
        let mut excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        excludes.extend(exclude_globs.iter().cloned());

        Ok(Self {
            root: root.into(),
            include: build_globset(include_globs)?,
            exclude: build_globset(&excludes)?,
            follow_symlinks,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let k = &config.knowledge;
        Self::new(&k.dir, &k.include_globs, &k.exclude_globs, k.follow_symlinks)
    }
}

impl DocumentSource for FilesystemSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            bail!("Knowledge directory does not exist: {}", self.root.display());
        }

        let mut docs = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative_path_string(relative);

            if self.exclude.is_match(&rel_str) || !self.include.is_match(&rel_str) {
                continue;
            }

            let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
                tracing::debug!(path = %rel_str, error = %e, "treating unreadable file as empty");
                String::new()
            });
            docs.push(Document::new(rel_str, text));
        }

        // Sort for deterministic chunk order
        docs.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(docs)
    }
}

/// Relative path with `/` separators on every platform.
fn relative_path_string(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
