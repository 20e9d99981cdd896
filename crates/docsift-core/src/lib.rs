//! # docsift core
//!
//! Shared, WASM-safe logic for docsift: the analysis data model, text
//! metrics, the similarity engine, and the collaborator traits the
//! analysis pipeline is written against (result store, content source,
//! word-cloud renderer).
//!
//! This crate contains no tokio, sqlx, network, or filesystem I/O. The
//! orchestrator that drives these pieces, and the concrete SQLite/HTTP
//! backends, live in the `docsift` app crate.

pub mod error;
pub mod metrics;
pub mod models;
pub mod similarity;
pub mod source;
pub mod store;
pub mod wordcloud;
