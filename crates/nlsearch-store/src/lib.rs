//! # nlsearch-store
//!
//! In-memory retrieval backend for nlsearch.
//!
//! [`MemoryIndex`] implements [`SearchBackend`](nlsearch_core::SearchBackend)
//! with exact-term matching and TF-IDF ranking. It is opened explicitly,
//! written through a single [`IndexWriter`], and read through point-in-time
//! states so queries never see a partial commit.

pub mod memory;
pub mod schema;

pub use memory::{CommitInfo, IndexState, IndexWriter, MemoryIndex};
pub use schema::IndexSchema;
