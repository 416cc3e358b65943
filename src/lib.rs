//! # coderag
//!
//! Retrieval over uploaded Java projects.
//!
//! A project arrives as a zip archive. Ingestion extracts it, splits every
//! source file into structural chunks (one whole-file chunk plus one chunk
//! per method or constructor), embeds the chunks through an Ollama server,
//! and writes them to a SQLite-backed vector index partitioned by project.
//! Retrieval embeds a natural-language query and returns the nearest chunks
//! of one project with their file and line provenance.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ zip      │──▶│ tree-sitter  │──▶│ Ollama       │──▶│ SQLite   │
//! │ archive  │   │ chunking     │   │ embeddings   │   │ vectors  │
//! └──────────┘   └──────────────┘   └──────────────┘   └────┬─────┘
//!                                                            │
//!                                        query ──▶ embed ──▶ ┴ ──▶ hits
//! ```
//!
//! Pure logic (models, chunking, the [`VectorIndex`](coderag_core::store::VectorIndex)
//! and [`Embedder`](coderag_core::embedding::Embedder) traits, hit formatting)
//! lives in `coderag-core`. This crate supplies the I/O.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite vector index |
//! | [`embedding`] | Ollama embedder and blocking-pool offload |
//! | [`archive`] | Project archive extraction |
//! | [`sources`] | Source file enumeration |
//! | [`ingest`] | Ingestion orchestration |
//! | [`retrieve`] | Project-scoped retrieval |
//! | [`pipeline`] | Component wiring |

pub mod archive;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod pipeline;
pub mod retrieve;
pub mod sources;
pub mod sqlite_store;
