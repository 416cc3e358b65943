//! SQLite-backed [`VectorIndex`] implementation.
//!
//! Vectors are stored as little-endian f32 BLOBs next to the chunk text and
//! its JSON metadata. Queries load the rows matching the filter in
//! insertion order and rank them by brute-force cosine distance in Rust.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use coderag_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use coderag_core::error::RagError;
use coderag_core::models::{ChunkMetadata, QueryMatch};
use coderag_core::store::{check_upsert_lengths, MetadataFilter, VectorIndex};

use crate::config::StoreConfig;
use crate::{db, migrate};

/// SQLite implementation of the [`VectorIndex`] trait.
///
/// Every statement is scoped to one collection, so several indexes can
/// share a database file without seeing each other's rows.
pub struct SqliteIndex {
    pool: SqlitePool,
    collection: String,
}

impl SqliteIndex {
    /// Connect to `config.path`, run migrations, and bind to `config.collection`.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool, &config.collection))
    }

    pub fn new(pool: SqlitePool, collection: &str) -> Self {
        Self {
            pool,
            collection: collection.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// WHERE clause for `filter` within a collection, plus its bind values
/// (after the leading collection bind).
fn filter_sql(filter: &MetadataFilter) -> (String, Vec<String>) {
    let mut sql = String::from("collection = ?");
    let mut binds = Vec::new();
    for (key, value) in filter.predicates() {
        if key == "project_id" {
            sql.push_str(" AND project_id = ?");
        } else {
            sql.push_str(" AND CAST(json_extract(metadata_json, ?) AS TEXT) = ?");
            binds.push(format!("$.\"{}\"", key));
        }
        binds.push(value.to_string());
    }
    (sql, binds)
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Vec<f32>],
        documents: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<()> {
        check_upsert_lengths(ids, vectors, documents, metadatas)?;

        let mut tx = self.pool.begin().await?;
        for (((id, vector), document), metadata) in ids
            .iter()
            .zip(vectors.iter())
            .zip(documents.iter())
            .zip(metadatas.iter())
        {
            let metadata_json = serde_json::to_string(metadata)?;
            sqlx::query(
                r#"
                INSERT INTO vectors (collection, id, project_id, document, metadata_json, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    project_id = excluded.project_id,
                    document = excluded.document,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&self.collection)
            .bind(id)
            .bind(&metadata.project_id)
            .bind(document)
            .bind(&metadata_json)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let (where_sql, binds) = filter_sql(filter);
        let sql = format!(
            "SELECT id, document, metadata_json, embedding FROM vectors WHERE {} ORDER BY rowid",
            where_sql
        );
        let mut query = sqlx::query(&sql).bind(&self.collection);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            let metadata_json: String = row.try_get("metadata_json")?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("Corrupt metadata for vector '{}'", id))?;
            let blob: Vec<u8> = row.try_get("embedding")?;
            matches.push(QueryMatch {
                distance: cosine_distance(vector, &blob_to_vec(&blob)),
                document: row.try_get("document")?,
                metadata,
                id,
            });
        }

        // Stable sort over rowid order: ties keep insertion order.
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

        let (where_sql, binds) = filter_sql(filter);
        let sql = format!("DELETE FROM vectors WHERE {}", where_sql);
        let mut query = sqlx::query(&sql).bind(&self.collection);
        for value in binds {
            query = query.bind(value);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self, filter: &MetadataFilter) -> Result<u64> {
        let (where_sql, binds) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM vectors WHERE {}", where_sql);
        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(&self.collection);
        for value in binds {
            query = query.bind(value);
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn projects(&self) -> Result<Vec<String>> {
        let projects = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT project_id FROM vectors WHERE collection = ? ORDER BY project_id",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderag_core::models::ChunkKind;
    use std::path::Path;
    use tempfile::TempDir;

    fn store_config(dir: &Path, collection: &str) -> StoreConfig {
        StoreConfig {
            path: dir.join("data").join("coderag.sqlite"),
            collection: collection.to_string(),
        }
    }

    fn meta(project: &str, kind: ChunkKind, name: &str, line: usize) -> ChunkMetadata {
        ChunkMetadata {
            project_id: project.to_string(),
            file_path: format!("{}/src/Order.java", project),
            kind,
            name: name.to_string(),
            start_line: Some(line),
            end_line: Some(line + 2),
        }
    }

    async fn put(index: &SqliteIndex, id: &str, vector: Vec<f32>, metadata: ChunkMetadata) {
        index
            .upsert(
                &[id.to_string()],
                &[vector],
                &[format!("void {}() {{}}", metadata.name)],
                &[metadata],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_orders_and_decodes() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        put(&index, "a", vec![1.0, 0.0], meta("p1", ChunkKind::Method, "east", 1)).await;
        put(&index, "b", vec![0.0, 1.0], meta("p1", ChunkKind::Method, "north", 5)).await;

        let hits = index
            .query(&[0.1, 1.0], 5, &MetadataFilter::project("p1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[0].metadata.name, "north");
        assert_eq!(hits[0].metadata.start_line, Some(5));
        assert_eq!(hits[0].document, "void north() {}");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let config = store_config(tmp.path(), "java_code");
        {
            let index = SqliteIndex::open(&config).await.unwrap();
            put(&index, "a", vec![1.0, 0.0], meta("p1", ChunkKind::Method, "kept", 1)).await;
            index.close().await;
        }
        let index = SqliteIndex::open(&config).await.unwrap();
        assert_eq!(index.count(&MetadataFilter::project("p1")).await.unwrap(), 1);
        let hits = index
            .query(&[1.0, 0.0], 1, &MetadataFilter::project("p1"))
            .await
            .unwrap();
        assert_eq!(hits[0].metadata.name, "kept");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let java = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        let other = SqliteIndex::open(&store_config(tmp.path(), "other"))
            .await
            .unwrap();
        put(&java, "a", vec![1.0], meta("p1", ChunkKind::Method, "x", 1)).await;

        assert_eq!(java.count(&MetadataFilter::new()).await.unwrap(), 1);
        assert_eq!(other.count(&MetadataFilter::new()).await.unwrap(), 0);
        assert!(other.projects().await.unwrap().is_empty());
        assert!(other
            .query(&[1.0], 10, &MetadataFilter::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_keeps_position() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        put(&index, "a", vec![1.0, 0.0], meta("p1", ChunkKind::Method, "first", 1)).await;
        put(&index, "b", vec![1.0, 0.0], meta("p1", ChunkKind::Method, "second", 1)).await;
        put(&index, "a", vec![1.0, 0.0], meta("p1", ChunkKind::Method, "renamed", 1)).await;

        let all = MetadataFilter::project("p1");
        assert_eq!(index.count(&all).await.unwrap(), 2);
        let hits = index.query(&[1.0, 0.0], 10, &all).await.unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].metadata.name, "renamed");
        assert_eq!(hits[1].id, "b");
    }

    #[tokio::test]
    async fn test_length_mismatch_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        let err = index
            .upsert(
                &["a".to_string(), "b".to_string()],
                &[vec![1.0], vec![1.0]],
                &["x".to_string()],
                &[meta("p1", ChunkKind::Method, "a", 1), meta("p1", ChunkKind::Method, "b", 1)],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::LengthMismatch { .. })
        ));
        assert_eq!(index.count(&MetadataFilter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_metadata_filters() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        put(&index, "u", vec![1.0], meta("p1", ChunkKind::FullUnit, "Order", 1)).await;
        put(&index, "m", vec![1.0], meta("p1", ChunkKind::Method, "total", 4)).await;
        put(&index, "o", vec![1.0], meta("p2", ChunkKind::Method, "total", 4)).await;

        let methods = MetadataFilter::project("p1").where_eq("type", "method");
        let hits = index.query(&[1.0], 10, &methods).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m");

        let by_line = MetadataFilter::new().where_eq("start_line", "4");
        assert_eq!(index.count(&by_line).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_and_projects() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        put(&index, "a", vec![1.0], meta("p2", ChunkKind::Method, "x", 1)).await;
        put(&index, "b", vec![1.0], meta("p1", ChunkKind::Method, "y", 1)).await;
        put(&index, "c", vec![1.0], meta("p1", ChunkKind::Method, "z", 1)).await;

        assert_eq!(index.projects().await.unwrap(), vec!["p1", "p2"]);

        let err = index.delete(&MetadataFilter::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::InvalidInput(_))
        ));

        assert_eq!(index.delete(&MetadataFilter::project("p1")).await.unwrap(), 2);
        assert_eq!(index.projects().await.unwrap(), vec!["p2"]);
    }

    #[tokio::test]
    async fn test_k_zero_returns_nothing() {
        let tmp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&store_config(tmp.path(), "java_code"))
            .await
            .unwrap();
        put(&index, "a", vec![1.0], meta("p1", ChunkKind::Method, "x", 1)).await;
        assert!(index
            .query(&[1.0], 0, &MetadataFilter::project("p1"))
            .await
            .unwrap()
            .is_empty());
    }
}
