//! # docsift
//!
//! Idempotent document analysis. Given a document id, docsift fetches the
//! text from a content source, computes paragraph, word and character
//! counts, scores it against a corpus of earlier documents for overlap,
//! optionally renders a word cloud, and stores exactly one result per
//! document. Every later request for the same id returns that result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ContentSource │──▶│   Analyzer   │──▶│ ResultStore  │
//! │ HTTP / FS    │   │ metrics+sim  │   │ SQLite / mem │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │ best effort
//!                           ▼
//!                    ┌──────────────┐
//!                    │  WordCloud   │
//!                    │  renderer    │
//!                    └──────────────┘
//! ```
//!
//! The pure pieces (metrics, similarity scoring, models, error taxonomy,
//! the store and collaborator traits) live in `docsift-core`; this crate
//! adds the I/O: SQLite, HTTP clients, the axum server and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`analyzer`] | The analysis orchestrator |
//! | [`similarity`] | Corpus-scan similarity backend |
//! | [`singleflight`] | Per-document in-flight locks |
//! | [`source_http`] | File-storing service client |
//! | [`source_fs`] | Local directory source |
//! | [`sources`] | Source selection |
//! | [`wordcloud`] | HTTP renderer and best-effort requester |
//! | [`sqlite_store`] | SQLite result store |
//! | [`stores`] | Store selection |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyze_cmd;
pub mod analyzer;
pub mod config;
pub mod db;
pub mod index_cmd;
pub mod migrate;
pub mod observability;
pub mod server;
pub mod similarity;
pub mod singleflight;
pub mod source_fs;
pub mod source_http;
pub mod sources;
pub mod sqlite_store;
pub mod stores;
pub mod wordcloud;
