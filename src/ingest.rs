//! Ingestion pipeline orchestration.
//!
//! Coordinates one run for a project: archive extraction → file
//! enumeration → structural chunking → batched embedding → index upsert.
//!
//! Per-file read and parse failures are logged and counted; they never
//! abort the run. A missing archive, an empty source tree, an embedding
//! worker failure, or an index write failure does. Batches are processed
//! strictly in order and each is committed before the next is embedded,
//! so an aborted run keeps its earlier batches.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use coderag_core::chunk::try_parse_source;
use coderag_core::embedding::Embedder;
use coderag_core::error::{validate_project_id, RagError};
use coderag_core::models::{Chunk, ChunkMetadata, IngestReport};
use coderag_core::store::{MetadataFilter, VectorIndex};

use crate::archive;
use crate::config::IngestConfig;
use crate::embedding::embed_offloaded;
use crate::sources;

/// Runs ingestion for one project at a time against a shared index and embedder.
pub struct Ingestor {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: IngestConfig,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: IngestConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
            batch_size: batch_size.max(1),
        }
    }

    /// Extract `{archive_dir}/{project_id}.zip` and index its source files.
    pub async fn ingest(&self, project_id: &str) -> Result<IngestReport> {
        let root = archive::extract_project_archive(&self.config, project_id)?;
        self.ingest_tree(project_id, &root).await
    }

    /// Index the source files under an already extracted `root`.
    ///
    /// Chunk file paths are relative to `root`'s parent.
    pub async fn ingest_tree(&self, project_id: &str, root: &Path) -> Result<IngestReport> {
        validate_project_id(project_id)?;

        let files =
            sources::list_source_files(root, &self.config.extension, &self.config.exclude_globs)?;
        if files.is_empty() {
            return Err(RagError::NoSourceFiles {
                extension: self.config.extension.clone(),
                root: root.to_path_buf(),
            }
            .into());
        }
        info!(project_id, files = files.len(), "found source files");

        let mut report = IngestReport {
            project_id: project_id.to_string(),
            files: files.len(),
            ..IngestReport::default()
        };

        let mut chunks: Vec<Chunk> = Vec::new();
        for file in &files {
            let source = match std::fs::read_to_string(&file.path) {
                Ok(source) => source,
                Err(err) => {
                    warn!(file = %file.relative_path, error = %err, "skipping unreadable file");
                    report.skipped_files += 1;
                    continue;
                }
            };

            match try_parse_source(&source, &file.relative_path, project_id) {
                Ok(file_chunks) => {
                    debug!(file = %file.relative_path, chunks = file_chunks.len(), "parsed file");
                    chunks.extend(file_chunks);
                }
                Err(err) => {
                    warn!(file = %file.relative_path, error = %err, "skipping file that failed to parse");
                    report.skipped_files += 1;
                }
            }
        }

        if chunks.is_empty() {
            info!(project_id, "no chunks extracted; nothing to index");
            return Ok(report);
        }

        if self.config.replace_existing {
            let removed = self
                .index
                .delete(&MetadataFilter::project(project_id))
                .await?;
            info!(project_id, removed, "removed existing project entries");
        }

        let total_batches = chunks.len().div_ceil(self.batch_size);
        for (i, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embed_offloaded(self.embedder.clone(), texts.clone()).await?;
            if vectors.len() != texts.len() {
                bail!(
                    "Embedder returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                );
            }

            let ids: Vec<String> = batch.iter().map(|c| c.id.clone()).collect();
            let metadatas: Vec<ChunkMetadata> = batch.iter().map(|c| c.metadata.clone()).collect();
            self.index
                .upsert(&ids, &vectors, &texts, &metadatas)
                .await
                .with_context(|| format!("Failed to index batch {}/{}", i + 1, total_batches))?;

            report.chunks += batch.len();
            report.batches += 1;
            info!(
                project_id,
                batch = i + 1,
                batches = total_batches,
                chunks = batch.len(),
                "indexed batch"
            );
        }

        info!(
            project_id,
            files = report.files,
            chunks = report.chunks,
            batches = report.batches,
            skipped_files = report.skipped_files,
            "ingestion complete"
        );

        Ok(report)
    }
}
