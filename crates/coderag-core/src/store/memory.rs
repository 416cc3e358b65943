//! In-memory [`VectorIndex`] implementation for tests and embedding hosts.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`, in insertion order.
//! Queries are brute-force cosine distance over the matching entries.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_distance;
use crate::error::RagError;
use crate::models::{ChunkMetadata, QueryMatch};

use super::{check_upsert_lengths, MetadataFilter, VectorIndex};

struct Entry {
    id: String,
    vector: Vec<f32>,
    document: String,
    metadata: ChunkMetadata,
}

/// Non-durable index holding everything in process memory.
pub struct InMemoryIndex {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory index lock poisoned")
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Vec<f32>],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<()> {
        check_upsert_lengths(ids, vectors, documents, metadatas)?;

        let mut entries = self.entries.write().map_err(poisoned)?;
        for (((id, vector), document), metadata) in ids
            .iter()
            .zip(vectors.iter())
            .zip(documents.iter())
            .zip(metadatas.iter())
        {
            let entry = Entry {
                id: id.clone(),
                vector: vector.clone(),
                document: document.clone(),
                metadata: metadata.clone(),
            };
            match entries.iter_mut().find(|e| e.id == *id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut matches: Vec<QueryMatch> = entries
            .iter()
            .filter(|e| filter.matches(&e.metadata))
            .map(|e| QueryMatch {
                id: e.id.clone(),
                distance: cosine_distance(vector, &e.vector),
                document: e.document.clone(),
                metadata: e.metadata.clone(),
            })
            .collect();

        // Stable sort: equal distances keep insertion order.
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(k);
        Ok(matches)
    }

    async fn delete(&self, filter: &MetadataFilter) -> Result<u64> {
        if filter.is_empty() {
            return Err(
                RagError::InvalidInput("delete requires a non-empty filter".to_string()).into(),
            );
        }
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|e| !filter.matches(&e.metadata));
        Ok((before - entries.len()) as u64)
    }

    async fn count(&self, filter: &MetadataFilter) -> Result<u64> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.iter().filter(|e| filter.matches(&e.metadata)).count() as u64)
    }

    async fn projects(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let projects: BTreeSet<&str> = entries
            .iter()
            .map(|e| e.metadata.project_id.as_str())
            .collect();
        Ok(projects.into_iter().map(str::to_string).collect())
    }
}
