//! # nlsearch-query
//!
//! Natural-language query pipeline.
//!
//! ```text
//! question ─> QueryPurifier ─> fragment ─┐
//!          └> ClassifierCache ─> label ──┴> QueryPlanBuilder ─> SearchBackend ─> ResultCursor
//! ```
//!
//! [`QueryExecutor`] wires the stages together over an injected
//! [`SearchBackend`](nlsearch_core::SearchBackend).

pub mod cursor;
pub mod executor;
pub mod plan;

pub use cursor::{CursorState, IndexRow, ResultCursor};
pub use executor::{DEFAULT_LIMIT, QueryExecutor, Translation};
pub use plan::{DEFAULT_TYPE_BOOST, QueryPlanBuilder, QueryPlanConfig};
