//! Source file enumeration.
//!
//! Walks an extraction root and collects every regular file with the
//! configured extension. Default excludes (`.git`, `target`,
//! `node_modules`) always apply; `ingest.exclude_globs` adds to them.
//! Globs match paths relative to the root.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A source file selected for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or caller-relative) path on disk.
    pub path: PathBuf,
    /// `/`-separated path relative to the root's parent, so it begins with
    /// the root directory name (the project id for extracted archives).
    pub relative_path: String,
}

/// List files under `root` ending in `.{extension}`, sorted by relative path.
pub fn list_source_files(
    root: &Path,
    extension: &str,
    exclude_globs: &[String],
) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("Source root does not exist: {}", root.display());
    }

    let extension = extension.trim_start_matches('.');

    let mut excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    excludes.extend(exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let base = root.parent().unwrap_or(root);
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }

        let within_root = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(within_root) {
            continue;
        }

        let relative = path.strip_prefix(base).unwrap_or(path);
        files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path: slash_path(relative),
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

fn slash_path(path: &Path) -> String {
    path.components()
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
