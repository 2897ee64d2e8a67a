//! Source scanning: walk `[sources] root` and turn matching files into
//! [`SourceDocument`]s.
//!
//! `.git`, `target` and `node_modules` are always excluded. A file that
//! cannot be read or extracted, or that yields no text, is logged and
//! skipped. Output is sorted by `source_id` (the path relative to the root).

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use tootur_core::models::SourceDocument;

use crate::config::SourcesConfig;
use crate::extract::{content_type_for_path, extract_text, MIME_TEXT};

pub fn scan_sources(config: &SourcesConfig) -> Result<Vec<SourceDocument>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Sources root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut docs = Vec::new();

    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match read_document(path) {
            Ok(text) if !text.trim().is_empty() => docs.push(SourceDocument::new(rel_str, text)),
            Ok(_) => warn!(source_id = %rel_str, "skipping file with no extractable text"),
            Err(e) => warn!(source_id = %rel_str, error = %e, "skipping file"),
        }
    }

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    debug!(root = %root.display(), documents = docs.len(), "scanned sources");
    Ok(docs)
}

fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let content_type = content_type_for_path(path).unwrap_or(MIME_TEXT);
    Ok(extract_text(&bytes, content_type)?)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
