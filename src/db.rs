//! SQLite connection pool for the vector database.
//!
//! One file holds every collection. An ingestion run writes batches in
//! transactions while retrieval scans the same table, so the pool runs in
//! WAL mode and waits on a locked database instead of failing with
//! `SQLITE_BUSY`. The file and its parent directories are created on first
//! open.

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::StoreConfig;

/// How long a connection waits for a competing batch commit.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool on `config.path`.
///
/// WAL with `synchronous = NORMAL` keeps committed batches across process
/// restarts without an fsync on every commit.
pub async fn connect(config: &StoreConfig) -> Result<SqlitePool> {
    let db_path = &config.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open vector store: {}", db_path.display()))?;

    Ok(pool)
}
