//! Vector index abstraction for coderag.
//!
//! The [`VectorIndex`] trait is the storage boundary of the pipeline:
//! ingestion upserts embedded chunks, retrieval runs filtered
//! nearest-neighbor queries. Projects share one physical index and are
//! separated by a [`MetadataFilter`] on `project_id`.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::RagError;
use crate::models::{ChunkMetadata, QueryMatch};

/// Conjunction of equality predicates over chunk metadata fields.
///
/// Keys are the serialized metadata names (`project_id`, `file_path`,
/// `type`, `name`, `start_line`, `end_line`); values compare as strings.
/// An empty filter matches every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    equals: BTreeMap<String, String>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter scoped to a single project.
    pub fn project(project_id: &str) -> Self {
        Self::new().where_eq("project_id", project_id)
    }

    /// Add an equality predicate, replacing any previous value for `key`.
    pub fn where_eq(mut self, key: &str, value: impl Into<String>) -> Self {
        self.equals.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.equals.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.equals
            .iter()
            .all(|(key, value)| metadata.field(key).as_deref() == Some(value.as_str()))
    }
}

/// Check the upsert precondition that all four columns line up.
pub fn check_upsert_lengths(
    ids: &[String],
    vectors: &[Vec<f32>],
    documents: &[String],
    metadatas: &[ChunkMetadata],
) -> Result<(), RagError> {
    let n = ids.len();
    if vectors.len() != n || documents.len() != n || metadatas.len() != n {
        return Err(RagError::LengthMismatch {
            ids: n,
            vectors: vectors.len(),
            documents: documents.len(),
            metadatas: metadatas.len(),
        });
    }
    Ok(())
}

/// Abstract, project-namespaced vector store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorIndex::upsert) | Insert or replace entries keyed by id |
/// | [`query`](VectorIndex::query) | Filtered k-nearest-neighbor search |
/// | [`delete`](VectorIndex::delete) | Remove entries matching a non-empty filter |
/// | [`count`](VectorIndex::count) | Count entries matching a filter |
/// | [`projects`](VectorIndex::projects) | List distinct project ids |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries keyed by `ids`.
    ///
    /// All four slices must have equal length; otherwise the call fails with
    /// [`RagError::LengthMismatch`] and nothing is written.
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Vec<f32>],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<()>;

    /// Return at most `k` entries matching `filter`, nearest first.
    ///
    /// Distance is cosine distance. Equal distances keep insertion order.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>>;

    /// Remove every entry matching `filter`, returning how many were removed.
    ///
    /// An empty filter is rejected with [`RagError::InvalidInput`].
    async fn delete(&self, filter: &MetadataFilter) -> Result<u64>;

    /// Count entries matching `filter`.
    async fn count(&self, filter: &MetadataFilter) -> Result<u64>;

    /// Sorted distinct `project_id` values present in the index.
    async fn projects(&self) -> Result<Vec<String>>;
}
