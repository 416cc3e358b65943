//! Typed failures that callers are expected to match on.
//!
//! Operations return `anyhow::Result`; these variants travel inside the
//! `anyhow::Error` and can be recovered with `downcast_ref::<RagError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Argument count mismatch: {ids} ids, {vectors} vectors, {documents} documents, {metadatas} metadatas"
    )]
    LengthMismatch {
        ids: usize,
        vectors: usize,
        documents: usize,
        metadatas: usize,
    },

    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("No .{extension} files found under {}", .root.display())]
    NoSourceFiles { extension: String, root: PathBuf },
}

/// Reject ids that cannot safely name a directory or partition.
pub fn validate_project_id(project_id: &str) -> Result<(), RagError> {
    let trimmed = project_id.trim();
    if trimmed.is_empty() {
        return Err(RagError::InvalidInput("project id is empty".to_string()));
    }
    if trimmed != project_id
        || project_id == "."
        || project_id == ".."
        || project_id.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(RagError::InvalidInput(format!(
            "project id {:?} is not a plain name",
            project_id
        )));
    }
    Ok(())
}
