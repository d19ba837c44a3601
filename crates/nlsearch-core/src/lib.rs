//! # nlsearch-core
//!
//! Core types and traits for nlsearch, a natural-language search layer over a
//! hierarchical content store.
//!
//! ## Architecture
//!
//! ```text
//! question ─┬─> CKY parse ─> purify ─> fragment ─┐
//!           │                                    ├─> QueryPlan ─> SearchBackend ─> Hits
//!           └─> DocumentClassifier ─> label ─────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Path-keyed field values produced by the indexer |
//! | [`CorpusSnapshot`] | Point-in-time view used for classifier training |
//! | [`QueryPlan`] | OR-combined weighted term clauses |
//! | [`Hit`] | A ranked backend match |
//! | [`ClassificationResult`] | Predicted document type |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`SearchBackend`] | Execute plans, expose snapshots |
//! | [`DocumentClassifier`] | Train on a snapshot, label questions |
//!
//! ## Related Crates
//!
//! - `nlsearch-grammar`: PCFG model, CKY parser and question purifier
//! - `nlsearch-classify`: k-NN and naive Bayes classifiers
//! - `nlsearch-store`: In-memory term index
//! - `nlsearch-index`: Content tree diff indexing
//! - `nlsearch-query`: Plan building, execution and result cursors

pub mod analysis;
pub mod error;
pub mod traits;
pub mod types;

pub use analysis::{analyze, term_frequencies};
pub use error::{ClassifyError, CursorError, Error, GrammarError, Result, StoreError};
pub use traits::*;
pub use types::*;
