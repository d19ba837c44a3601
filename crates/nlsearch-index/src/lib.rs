//! # nlsearch-index
//!
//! Keeps the search index in step with a hierarchical content tree.
//!
//! A [`ContentNode`] tree is loaded from JSON; [`ContentIndexer`] diffs two
//! versions of it and stages upserts and subtree deletions on an
//! [`IndexWriter`](nlsearch_store::IndexWriter).

pub mod content;
pub mod indexer;

pub use content::ContentNode;
pub use indexer::{ContentIndexer, DiffSummary};
