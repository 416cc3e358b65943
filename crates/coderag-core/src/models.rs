//! Core data models used throughout coderag.
//!
//! These types represent the chunks, index matches, and retrieval hits
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Granularity of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// A single method or constructor declaration.
    Method,
    /// An entire source file, named after its first type declaration.
    FullUnit,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Method => "method",
            ChunkKind::FullUnit => "full_unit",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance carried by every indexed chunk.
///
/// `start_line` / `end_line` are 1-based and inclusive, and only present on
/// [`ChunkKind::Method`] chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub project_id: String,
    pub file_path: String,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl ChunkMetadata {
    /// Look up a metadata field by its serialized key, rendered as a string.
    ///
    /// Used for equality filtering; numeric fields compare by their decimal
    /// form. Unknown keys and absent line numbers yield `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "project_id" => Some(self.project_id.clone()),
            "file_path" => Some(self.file_path.clone()),
            "type" => Some(self.kind.as_str().to_string()),
            "name" => Some(self.name.clone()),
            "start_line" => self.start_line.map(|l| l.to_string()),
            "end_line" => self.end_line.map(|l| l.to_string()),
            _ => None,
        }
    }
}

/// A named, positioned fragment of source text prepared for embedding.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A raw nearest-neighbor result from a [`VectorIndex`](crate::store::VectorIndex).
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    /// Cosine distance to the query vector (`0.0` = identical direction).
    pub distance: f64,
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// A ranked, provenance-annotated chunk returned to the retrieval caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// 1-based position in the result list.
    pub rank: usize,
    /// Rounded cosine distance (lower is closer).
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub name: String,
    pub file_path: String,
    /// `"start–end"`, with `?` for absent line numbers.
    pub lines: String,
    pub code: String,
}

impl Hit {
    /// `file_path:start–end`.
    pub fn provenance(&self) -> String {
        format!("{}:{}", self.file_path, self.lines)
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub project_id: String,
    /// Source files discovered under the extraction root.
    pub files: usize,
    /// Chunks embedded and upserted.
    pub chunks: usize,
    pub batches: usize,
    /// Files that could not be read or failed to parse.
    pub skipped_files: usize,
}
