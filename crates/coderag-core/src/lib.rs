//! # coderag core
//!
//! Shared, I/O-free logic for coderag: data models, the Java source
//! chunker, the embedding trait and vector math, the vector index
//! abstraction, and retrieval hit formatting.
//!
//! This crate contains no tokio, sqlx, network, or filesystem code. The
//! `coderag` application crate supplies the durable index, the HTTP
//! embedding client, and the ingestion/retrieval services built on top.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod retrieval;
pub mod store;
