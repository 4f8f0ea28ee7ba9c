//! Autoblog Core Library
//!
//! This crate provides the core functionality for Autoblog, a local-first
//! blogging toolkit. Posts are authored as markdown files with YAML front
//! matter and stored as automerge documents, so every device holding a
//! replica can edit offline and converge through CRDT merge.
//!
//! # Architecture
//!
//! - **Automerge**: source of truth for post content, enables CRDT-based sync
//! - **Filesystem storage**: one `.automerge` binary per document
//! - **Index document**: one more automerge document mapping slugs to
//!   document IDs
//!
//! # Modules
//!
//! - `config`: application configuration (JSON file + environment overrides)
//! - `document`: document identifiers and filesystem document storage
//! - `error`: error types and coarse error classification
//! - `index`: the slug -> document ID index
//! - `markdown`: front matter parsing, slug generation, HTML rendering
//! - `post`: blog post data model
//! - `store`: high-level upload/list/get/delete operations
//! - `sync`: WebSocket sync client driving the automerge sync protocol
//! - `util`: retry and byte-formatting helpers

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod markdown;
pub mod post;
pub mod store;
pub mod sync;
pub mod util;

pub use config::Config;
pub use document::{DocumentId, DocumentStorage};
pub use error::{classify, AutoblogError, ErrorKind, Result};
pub use index::{BlogIndex, IndexHandle};
pub use post::{BlogPost, PostStatus, PostSummary};
pub use store::{BlogStore, Listing, UploadOutcome};
pub use sync::{SyncClient, SyncReport};
