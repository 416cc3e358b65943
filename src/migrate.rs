//! Schema migrations for the vector database.
//!
//! One `vectors` table holds every collection. The implicit `rowid` records
//! insertion order, which queries use to break distance ties; an upsert that
//! hits an existing `(collection, id)` updates the row in place and keeps
//! its rowid. All statements are idempotent.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create vectors table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vectors (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            document TEXT NOT NULL,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            embedding BLOB NOT NULL,
            UNIQUE(collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vectors_collection_project ON vectors(collection, project_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
