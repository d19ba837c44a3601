//! Core traits for nlsearch components.
//!
//! - [`SearchBackend`]: Execute query plans and expose corpus snapshots
//! - [`DocumentClassifier`]: Predict a document type for a question
//!
//! Both are object safe so implementations can be selected at runtime and
//! injected as `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::error::{ClassifyError, StoreError};
use crate::types::{ClassificationResult, CorpusSnapshot, Hit, IndexStats, QueryPlan};

// ============================================================================
// Retrieval
// ============================================================================

/// Ranked retrieval over indexed documents.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run `plan` and return at most `limit` hits, best first.
    ///
    /// An empty plan is valid and returns no hits.
    async fn search(&self, plan: &QueryPlan, limit: usize) -> Result<Vec<Hit>, StoreError>;

    /// Point-in-time view of the indexed documents.
    async fn snapshot(&self) -> Result<CorpusSnapshot, StoreError>;

    /// Index statistics.
    async fn stats(&self) -> Result<IndexStats, StoreError>;
}

// ============================================================================
// Classification
// ============================================================================

/// Supervised text classifier trained from an index snapshot.
///
/// Training needs `&mut self`; inference only reads, so a trained classifier
/// can be shared across concurrent queries behind an `Arc`.
pub trait DocumentClassifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Learn from every document in `corpus` carrying both fields.
    fn train(
        &mut self,
        corpus: &CorpusSnapshot,
        text_field: &str,
        class_field: &str,
    ) -> Result<(), ClassifyError>;

    /// Whether a successful `train` call has happened.
    fn is_trained(&self) -> bool;

    /// Predict a class for `text`.
    ///
    /// Returns `Ok(None)` when the model has no evidence either way, and
    /// [`ClassifyError::Untrained`] before training.
    fn assign_class(&self, text: &str) -> Result<Option<ClassificationResult>, ClassifyError>;
}
