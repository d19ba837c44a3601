//! Core types for nlsearch.
//!
//! ## Indexed content
//! - [`Document`]: A path-keyed set of field values
//! - [`CorpusSnapshot`]: Point-in-time view of every indexed document
//! - [`IndexStats`]: Document count and generation of an index
//!
//! ## Querying
//! - [`Clause`]: A boosted exact-term match against one field
//! - [`QueryPlan`]: OR-combined clauses sent to the retrieval backend
//! - [`Hit`]: A ranked match returned by the backend
//!
//! ## Classification
//! - [`ClassificationResult`]: Predicted document type for a question

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Field names
// ============================================================================

/// Field holding the document path.
pub const PATH_FIELD: &str = "path";
/// Title field.
pub const TITLE_FIELD: &str = "jcr:title";
/// Description field.
pub const DESCRIPTION_FIELD: &str = "jcr:description";
/// Generic body field.
pub const TEXT_FIELD: &str = "text";
/// Document type field.
pub const TYPE_FIELD: &str = "jcr:primaryType";
/// Synthetic field exposing the relevance score of a hit.
pub const SCORE_FIELD: &str = "jcr:score";

// ============================================================================
// Documents
// ============================================================================

/// An indexed document, keyed by its content path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Absolute content path (`/`, `/a/b`)
    pub path: String,
    /// Field values by name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Document {
    /// Create an empty document at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field value. `path` resolves to the document path.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == PATH_FIELD {
            return Some(&self.path);
        }
        self.fields.get(name).map(String::as_str)
    }
}

/// Immutable point-in-time view of an index.
///
/// Cloning is cheap; all clones share the same document list. A snapshot never
/// observes commits made after it was taken.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    generation: u64,
    documents: Arc<[Document]>,
}

impl CorpusSnapshot {
    /// Create a snapshot for `generation`.
    #[must_use]
    pub fn new(generation: u64, documents: impl Into<Arc<[Document]>>) -> Self {
        Self {
            generation,
            documents: documents.into(),
        }
    }

    /// Commit generation this snapshot was taken at.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All documents in the snapshot.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Index statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of live documents
    pub total_documents: u64,
    /// Current commit generation
    pub generation: u64,
    /// Last commit time
    pub last_commit: Option<DateTime<Utc>>,
}

// ============================================================================
// Query plans
// ============================================================================

/// Exact-term match against one field, weighted by `boost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Field to match
    pub field: String,
    /// Term that must appear in the field (not analyzed)
    pub term: String,
    /// Score multiplier, 1.0 for plain clauses
    pub boost: f32,
}

impl Clause {
    /// Unboosted clause.
    #[must_use]
    pub fn term(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Clause with an explicit boost.
    #[must_use]
    pub fn boosted(field: impl Into<String>, term: impl Into<String>, boost: f32) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            boost,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.field, self.term)?;
        if (self.boost - 1.0).abs() > f32::EPSILON {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

/// Ordered clauses combined with OR semantics.
///
/// An empty plan is valid and matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub clauses: Vec<Clause>,
}

impl QueryPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Iterate over the clauses in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a QueryPlan {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

/// A ranked match returned by a retrieval backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document path
    pub path: String,
    /// Relevance score
    pub score: f32,
    /// Stored field values
    pub fields: BTreeMap<String, String>,
}

// ============================================================================
// Classification
// ============================================================================

/// Predicted document type for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Assigned class label
    pub label: String,
    /// Confidence in `[0, 1]`
    pub score: f64,
}

impl ClassificationResult {
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}
