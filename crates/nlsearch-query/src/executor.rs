//! Query execution.

use nlsearch_classify::{ClassifierCache, ClassifierConfig};
use nlsearch_core::{ClassificationResult, Error, QueryPlan, SearchBackend};
use nlsearch_grammar::{GrammarModel, QueryPurifier};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::cursor::ResultCursor;
use crate::plan::{QueryPlanBuilder, QueryPlanConfig};

/// Default maximum number of hits per query.
pub const DEFAULT_LIMIT: usize = 100;

/// Intermediate signals behind a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// Purified fragment; `None` when the question did not parse
    pub fragment: Option<String>,
    /// Predicted document type
    pub classification: Option<ClassificationResult>,
    pub plan: QueryPlan,
}

/// Turns natural-language questions into ranked results.
pub struct QueryExecutor {
    /// Retrieval backend
    backend: Arc<dyn SearchBackend>,
    /// Question purifier
    purifier: QueryPurifier,
    /// Per-generation document type classifier
    classifier: ClassifierCache,
    /// Plan builder
    planner: QueryPlanBuilder,
    /// Result cap
    limit: usize,
}

impl QueryExecutor {
    /// Create a new query executor.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        grammar: Arc<GrammarModel>,
        classifier_config: ClassifierConfig,
        plan_config: QueryPlanConfig,
        limit: usize,
    ) -> Self {
        Self {
            backend,
            purifier: QueryPurifier::new(grammar),
            classifier: ClassifierCache::new(classifier_config),
            planner: QueryPlanBuilder::new(plan_config),
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn classifier(&self) -> &ClassifierCache {
        &self.classifier
    }

    /// Purify and classify `question`, then build its plan.
    pub async fn translate(&self, question: &str) -> Translation {
        let fragment = self.purifier.filter_question(question);
        if fragment.is_none() {
            debug!("No parse for {:?}, no lexical clauses", question);
        }

        let classification = self.classifier.classify(self.backend.as_ref(), question).await;
        let plan = self
            .planner
            .build(fragment.as_deref(), classification.as_ref());
        debug!("Plan for {:?}: {}", question, plan);

        Translation {
            fragment,
            classification,
            plan,
        }
    }

    /// Plan for `question`.
    pub async fn plan(&self, question: &str) -> QueryPlan {
        self.translate(question).await.plan
    }

    /// Run `question` with the configured result cap.
    pub async fn execute(&self, question: &str) -> Result<ResultCursor, Error> {
        self.execute_with_limit(question, self.limit).await
    }

    /// Run `question`, returning at most `limit` rows.
    ///
    /// Backend failures are returned as [`Error::Store`].
    pub async fn execute_with_limit(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<ResultCursor, Error> {
        let (_, cursor) = self.execute_explained(question, limit).await?;
        Ok(cursor)
    }

    /// Run `question` and return the translation whose plan was executed
    /// alongside its results.
    pub async fn execute_explained(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<(Translation, ResultCursor), Error> {
        debug!("Executing question: {}", question);

        let translation = self.translate(question).await;
        let hits = self.backend.search(&translation.plan, limit).await?;

        debug!("Found {} results", hits.len());
        Ok((translation, ResultCursor::new(hits)))
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("classifier", &self.classifier)
            .field("planner", &self.planner)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
