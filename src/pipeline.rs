//! Wiring of index, embedder, ingestion, and retrieval.
//!
//! [`Pipeline::open`] builds the production components from a [`Config`];
//! [`Pipeline::with_components`] accepts any [`VectorIndex`] and
//! [`Embedder`], which is how tests inject fakes.

use anyhow::Result;
use std::sync::Arc;

use coderag_core::embedding::Embedder;
use coderag_core::models::{Hit, IngestReport};
use coderag_core::store::VectorIndex;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::ingest::Ingestor;
use crate::retrieve::Retriever;
use crate::sqlite_store::SqliteIndex;

/// One index and one embedder shared by an [`Ingestor`] and a [`Retriever`].
pub struct Pipeline {
    index: Arc<dyn VectorIndex>,
    ingestor: Ingestor,
    retriever: Retriever,
}

impl Pipeline {
    /// Open the SQLite index at `store.path` and connect the configured embedder.
    pub async fn open(config: &Config) -> Result<Self> {
        let index: Arc<dyn VectorIndex> = Arc::new(SqliteIndex::open(&config.store).await?);
        let embedder = create_embedder(&config.embedding)?;
        Ok(Self::with_components(config, index, embedder))
    }

    pub fn with_components(
        config: &Config,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let ingestor = Ingestor::new(
            index.clone(),
            embedder.clone(),
            config.ingest.clone(),
            config.embedding.batch_size,
        );
        let retriever = Retriever::new(index.clone(), embedder, config.retrieval.clone());
        Self {
            index,
            ingestor,
            retriever,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn ingest(&self, project_id: &str) -> Result<IngestReport> {
        self.ingestor.ingest(project_id).await
    }

    pub async fn retrieve(
        &self,
        project_id: &str,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<Hit>> {
        self.retriever.retrieve(project_id, query, n_results).await
    }

    /// Projects currently present in the index.
    pub async fn projects(&self) -> Result<Vec<String>> {
        self.index.projects().await
    }
}
