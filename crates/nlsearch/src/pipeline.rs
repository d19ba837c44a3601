//! Wiring of the search pipeline from a [`Config`].

use nlsearch_core::Error;
use nlsearch_grammar::{GrammarModel, question_grammar};
use nlsearch_index::{ContentIndexer, ContentNode, DiffSummary};
use nlsearch_query::QueryExecutor;
use nlsearch_store::MemoryIndex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Config, GrammarConfig};

/// Configured grammar file, or the built-in question grammar.
pub fn load_grammar(config: &GrammarConfig) -> Result<GrammarModel, Error> {
    let grammar = match &config.path {
        Some(path) => {
            debug!("Loading grammar from {}", path.display());
            GrammarModel::from_file(path)?
        }
        None => question_grammar()?,
    };
    Ok(grammar)
}

/// An index over one content tree plus the executor that queries it.
#[derive(Debug)]
pub struct Pipeline {
    index: MemoryIndex,
    executor: QueryExecutor,
    summary: DiffSummary,
}

impl Pipeline {
    /// Index `content` and build an executor over it.
    pub async fn open(config: &Config, content: &ContentNode) -> Result<Self, Error> {
        let grammar = Arc::new(load_grammar(&config.grammar)?);

        let index = MemoryIndex::open(config.store.clone());
        let mut writer = index.writer()?;
        let summary = ContentIndexer::new().index_tree(content, &mut writer)?;
        let commit = writer.commit().await?;
        info!(
            "Indexed {} nodes (generation {})",
            summary.upserted, commit.generation
        );

        let executor = QueryExecutor::new(
            Arc::new(index.clone()),
            grammar,
            config.classifier.clone(),
            config.query.plan.clone(),
            config.query.limit,
        );

        Ok(Self {
            index,
            executor,
            summary,
        })
    }

    #[must_use]
    pub fn index(&self) -> &MemoryIndex {
        &self.index
    }

    #[must_use]
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// What the initial indexing staged.
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        self.summary
    }

    /// Bring the index from `before` to `after`.
    pub async fn update(
        &self,
        before: &ContentNode,
        after: &ContentNode,
    ) -> Result<DiffSummary, Error> {
        let mut writer = self.index.writer()?;
        let summary = ContentIndexer::new().apply_diff(before, after, &mut writer)?;
        writer.commit().await?;
        Ok(summary)
    }
}
