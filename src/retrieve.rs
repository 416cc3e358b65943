//! Project-scoped retrieval.
//!
//! Embeds the query on the blocking pool, asks the index for the nearest
//! chunks of one project, and formats them as ranked [`Hit`]s.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use coderag_core::embedding::Embedder;
use coderag_core::error::RagError;
use coderag_core::models::Hit;
use coderag_core::retrieval::{format_hits, render_context};
use coderag_core::store::{MetadataFilter, VectorIndex};

use crate::config::RetrievalConfig;
use crate::embedding::embed_query_offloaded;

/// Answers project-scoped queries with ranked [`Hit`]s.
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Return up to `n_results` hits from `project_id`, nearest first.
    ///
    /// An empty or whitespace-only query fails with
    /// [`RagError::InvalidInput`] before anything is embedded.
    pub async fn retrieve(
        &self,
        project_id: &str,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<Hit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::InvalidInput("query is empty".to_string()).into());
        }
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let vector = embed_query_offloaded(self.embedder.clone(), query).await?;
        let matches = self
            .index
            .query(&vector, n_results, &MetadataFilter::project(project_id))
            .await?;
        debug!(project_id, requested = n_results, found = matches.len(), "retrieved chunks");

        Ok(format_hits(matches, self.config.score_precision))
    }

    /// [`retrieve`](Self::retrieve) with `retrieval.default_results`.
    pub async fn retrieve_default(&self, project_id: &str, query: &str) -> Result<Vec<Hit>> {
        self.retrieve(project_id, query, self.config.default_results)
            .await
    }

    /// Retrieve and render hits as a prompt context block.
    pub async fn retrieve_context(
        &self,
        project_id: &str,
        query: &str,
        n_results: usize,
    ) -> Result<String> {
        let hits = self.retrieve(project_id, query, n_results).await?;
        Ok(render_context(&hits))
    }
}
