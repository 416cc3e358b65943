//! Project archive extraction.
//!
//! Uploaded projects arrive as `{archive_dir}/{project_id}.zip`. Each
//! ingestion run extracts a fresh copy into `{extract_dir}/{project_id}/`,
//! replacing whatever a previous run left there.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use coderag_core::error::{validate_project_id, RagError};

use crate::config::IngestConfig;

/// Location of the uploaded archive for `project_id`.
pub fn archive_path(config: &IngestConfig, project_id: &str) -> PathBuf {
    config.archive_dir.join(format!("{}.zip", project_id))
}

/// Directory the archive for `project_id` is extracted into.
pub fn extraction_root(config: &IngestConfig, project_id: &str) -> PathBuf {
    config.extract_dir.join(project_id)
}

/// Extract the project's archive and return the extraction root.
///
/// # Errors
///
/// - [`RagError::InvalidInput`] if the project id is not usable as a path segment.
/// - [`RagError::ArchiveNotFound`] if the archive does not exist.
/// - I/O and zip errors while clearing or writing the extraction directory.
pub fn extract_project_archive(config: &IngestConfig, project_id: &str) -> Result<PathBuf> {
    validate_project_id(project_id)?;

    let archive = archive_path(config, project_id);
    if !archive.is_file() {
        return Err(RagError::ArchiveNotFound(archive).into());
    }

    let root = extraction_root(config, project_id);
    if root.exists() {
        std::fs::remove_dir_all(&root)
            .with_context(|| format!("Failed to clear {}", root.display()))?;
    }
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create {}", root.display()))?;

    let entries = unpack(&archive, &root)?;
    info!(
        project_id,
        archive = %archive.display(),
        root = %root.display(),
        entries,
        "extracted project archive"
    );

    Ok(root)
}

/// Write every entry of `archive` under `dest`, returning the number of files written.
///
/// Entries whose names would land outside `dest` are skipped.
fn unpack(archive: &Path, dest: &Path) -> Result<usize> {
    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("Invalid zip archive: {}", archive.display()))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                warn!(entry = entry.name(), "skipping archive entry outside extraction root");
                continue;
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}
